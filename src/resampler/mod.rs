//! Sample rate conversion.
//!
//! A [`Resampler`] turns a block of interleaved stereo float frames at one
//! rate into frames at another, driven by an explicit ratio
//! (`output_rate / input_rate`) that may change between calls.

#[cfg(feature = "hermite")]
pub mod hermite;
#[cfg(feature = "nearest")]
pub mod nearest;
pub mod null;

use crate::core::config::FilterConfig;
use crate::core::error::{Error, PluginKind};
use crate::core::registry::{Plugin, Registry, RegistryBuilder};
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;

/// Version of the resampler plugin interface.
pub const RESAMPLER_API_VERSION: u32 = 1;

/// Resampler used when the configuration does not name one.
#[cfg(feature = "hermite")]
pub const DEFAULT_RESAMPLER: &str = "hermite";
#[cfg(all(not(feature = "hermite"), feature = "nearest"))]
pub const DEFAULT_RESAMPLER: &str = "nearest";
#[cfg(all(not(feature = "hermite"), not(feature = "nearest")))]
pub const DEFAULT_RESAMPLER: &str = "null";

/// Quality hint passed to `init`. Variants without tunable quality ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResamplerQuality {
    DontCare,
    Lowest,
    Lower,
    #[default]
    Normal,
    Higher,
    Highest,
}

/// One call's worth of resampling work.
///
/// `input` and `output` hold interleaved stereo frames; their lengths fix the
/// offered input frame count and the output capacity. `process` fills in
/// `frames_consumed` and `frames_produced`.
pub struct ResampleRequest<'a> {
    pub input: &'a [f32],
    pub output: &'a mut [f32],
    pub ratio: f64,
    pub frames_consumed: usize,
    pub frames_produced: usize,
}

impl<'a> ResampleRequest<'a> {
    pub fn new(input: &'a [f32], output: &'a mut [f32], ratio: f64) -> Self {
        ResampleRequest {
            input,
            output,
            ratio,
            frames_consumed: 0,
            frames_produced: 0,
        }
    }

    pub fn input_frames(&self) -> usize {
        self.input.len() / 2
    }

    pub fn output_capacity(&self) -> usize {
        self.output.len() / 2
    }

    /// Input frames advanced per output frame, or `None` for a ratio that
    /// cannot be honoured.
    pub(crate) fn step(&self) -> Option<f64> {
        if self.ratio > 0.0 && self.ratio.is_finite() {
            Some(1.0 / self.ratio)
        } else {
            None
        }
    }
}

/// A sample rate converter instance.
///
/// `process` never blocks and never allocates. It stops early when the
/// output is full; frames it did not report as consumed must be offered
/// again on the next call. State carries across calls, so a ratio change
/// between calls continues from the current phase.
pub trait Resampler: Send {
    fn process(&mut self, request: &mut ResampleRequest<'_>);

    /// Clears history and phase.
    fn reset(&mut self);

    fn ident(&self) -> &str;

    /// Frames of delay between an input frame and its reproduction.
    fn latency_frames(&self) -> usize {
        0
    }

    /// True if `process` does nothing and the caller must forward input
    /// unchanged itself.
    fn is_passthrough(&self) -> bool {
        false
    }
}

/// Constructor signature: config, bandwidth modifier, quality, host caps.
pub type ResamplerInit =
    fn(&FilterConfig, f64, ResamplerQuality, SimdCaps) -> Result<Box<dyn Resampler>, Error>;

/// Registry entry for a resampler implementation.
#[derive(Clone, Copy)]
pub struct ResamplerDescriptor {
    pub ident: &'static str,
    pub api_version: u32,
    pub accel: SimdCaps,
    pub init: ResamplerInit,
}

impl ResamplerDescriptor {
    /// Runs `init`, tagging any failure with this resampler's ident.
    pub fn instantiate(
        &self,
        config: &FilterConfig,
        bandwidth_mod: f64,
        quality: ResamplerQuality,
        caps: SimdCaps,
    ) -> Result<Box<dyn Resampler>, Error> {
        (self.init)(config, bandwidth_mod, quality, caps)
            .map_err(|e| Error::plugin_init(self.ident, e))
    }
}

impl Plugin for ResamplerDescriptor {
    const API_VERSION: u32 = RESAMPLER_API_VERSION;
    const KIND: PluginKind = PluginKind::Resampler;

    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn ident(&self) -> &str {
        self.ident
    }

    fn accel(&self) -> SimdCaps {
        self.accel
    }
}

/// Builds the table of resamplers compiled into this crate.
pub fn builtin_registry() -> Result<Registry<ResamplerDescriptor>, Error> {
    builtin_builder().map(RegistryBuilder::build)
}

/// Builtin resamplers, open for further registration.
pub fn builtin_builder() -> Result<RegistryBuilder<ResamplerDescriptor>, Error> {
    let builder = RegistryBuilder::new().register(null::DESCRIPTOR)?;
    #[cfg(feature = "nearest")]
    let builder = builder.register(nearest::DESCRIPTOR)?;
    #[cfg(feature = "hermite")]
    let builder = builder
        .register(hermite::DESCRIPTOR)?
        .register(hermite::DESCRIPTOR_F32X4)?;
    Ok(builder)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    /// Feeds `input` through `resampler` in `chunk`-frame pieces with an
    /// output capacity of `capacity` frames, re-offering unconsumed frames,
    /// and checks frame accounting on every call.
    pub(crate) fn drive(
        resampler: &mut dyn Resampler,
        input: &[f32],
        ratio: f64,
        chunk: usize,
        capacity: usize,
    ) -> Vec<f32> {
        let mut out = Vec::new();
        let mut scratch = vec![0.0f32; capacity * 2];
        let total = input.len() / 2;
        let mut pos = 0;
        let mut offered_total = 0;
        let mut consumed_total = 0;

        while pos < total {
            let end = (pos + chunk).min(total);
            let mut req = ResampleRequest::new(&input[pos * 2..end * 2], &mut scratch, ratio);
            resampler.process(&mut req);

            let (consumed, produced) = (req.frames_consumed, req.frames_produced);
            assert!(consumed <= end - pos);
            assert!(produced <= capacity);

            offered_total += end - pos;
            consumed_total += consumed;
            assert!(consumed_total <= offered_total);

            out.extend_from_slice(&scratch[..produced * 2]);
            pos += consumed;
            assert!(consumed > 0 || produced > 0);
        }

        out
    }

    #[test]
    fn test_builtin_registry_contents() {
        let registry = builtin_registry().unwrap();
        let idents = registry.idents();
        assert!(idents.contains(&"null"));
        #[cfg(feature = "nearest")]
        assert!(idents.contains(&"nearest"));
        #[cfg(feature = "hermite")]
        assert!(idents.contains(&"hermite"));
        assert!(registry.get_implementation(DEFAULT_RESAMPLER, SimdCaps::empty()).is_ok());
    }

    #[test]
    fn test_foreign_version_rejected() {
        let stale = ResamplerDescriptor {
            api_version: RESAMPLER_API_VERSION + 1,
            ident: "stale",
            ..null::DESCRIPTOR
        };
        let result = builtin_builder().unwrap().register(stale);
        assert!(matches!(result, Err(Error::VersionMismatch { .. })));
    }
}
