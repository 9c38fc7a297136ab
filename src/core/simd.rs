bitflags::bitflags! {
    /// Vector instruction extensions available on the running CPU.
    ///
    /// Implementations advertise the extensions they were written for and the
    /// registry hands out the fastest variant the host mask allows.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SimdCaps: u32 {
        const SSE    = 1 << 0;
        const SSE2   = 1 << 1;
        const SSE3   = 1 << 2;
        const SSSE3  = 1 << 3;
        const SSE4   = 1 << 4;
        const SSE42  = 1 << 5;
        const AVX    = 1 << 6;
        const AVX2   = 1 << 7;
        const NEON   = 1 << 8;
        const VMX    = 1 << 9;
        const SIMD128 = 1 << 10;

        /// Any extension wide enough for four f32 lanes.
        const F32X4 = Self::SSE2.bits() | Self::NEON.bits() | Self::VMX.bits() | Self::SIMD128.bits();
    }
}

impl SimdCaps {
    /// Returns the extensions the host supports.
    ///
    /// With the `std` feature on x86 this queries the CPU at runtime; otherwise
    /// it reports what the crate was compiled for.
    pub fn detect() -> Self {
        #[cfg(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64")))]
        {
            let mut caps = SimdCaps::empty();
            caps.set(SimdCaps::SSE, std::is_x86_feature_detected!("sse"));
            caps.set(SimdCaps::SSE2, std::is_x86_feature_detected!("sse2"));
            caps.set(SimdCaps::SSE3, std::is_x86_feature_detected!("sse3"));
            caps.set(SimdCaps::SSSE3, std::is_x86_feature_detected!("ssse3"));
            caps.set(SimdCaps::SSE4, std::is_x86_feature_detected!("sse4.1"));
            caps.set(SimdCaps::SSE42, std::is_x86_feature_detected!("sse4.2"));
            caps.set(SimdCaps::AVX, std::is_x86_feature_detected!("avx"));
            caps.set(SimdCaps::AVX2, std::is_x86_feature_detected!("avx2"));
            caps
        }
        #[cfg(not(all(feature = "std", any(target_arch = "x86", target_arch = "x86_64"))))]
        {
            Self::compiled()
        }
    }

    /// Extensions enabled at compile time through `target_feature`.
    pub fn compiled() -> Self {
        let mut caps = SimdCaps::empty();
        caps.set(SimdCaps::SSE, cfg!(target_feature = "sse"));
        caps.set(SimdCaps::SSE2, cfg!(target_feature = "sse2"));
        caps.set(SimdCaps::SSE3, cfg!(target_feature = "sse3"));
        caps.set(SimdCaps::SSSE3, cfg!(target_feature = "ssse3"));
        caps.set(SimdCaps::SSE4, cfg!(target_feature = "sse4.1"));
        caps.set(SimdCaps::SSE42, cfg!(target_feature = "sse4.2"));
        caps.set(SimdCaps::AVX, cfg!(target_feature = "avx"));
        caps.set(SimdCaps::AVX2, cfg!(target_feature = "avx2"));
        caps.set(SimdCaps::NEON, cfg!(target_feature = "neon"));
        caps.set(SimdCaps::SIMD128, cfg!(target_feature = "simd128"));
        caps
    }

    /// True if a variant that needs any of `accel` can run on this host.
    ///
    /// An empty `accel` is the scalar baseline and always qualifies.
    #[inline]
    pub fn supports(self, accel: SimdCaps) -> bool {
        accel.is_empty() || self.intersects(accel)
    }
}
