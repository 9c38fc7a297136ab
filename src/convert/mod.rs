//! Conversion between interleaved s16 and normalized float samples.
//!
//! All functions take sample counts (a stereo block of `n` frames is `2n`
//! samples) implicitly through slice lengths and convert
//! `min(output.len(), input.len())` samples. The SIMD variants in [`simd`]
//! produce bit-identical output to the scalar ones here.

pub mod simd;

use crate::core::simd::SimdCaps;

/// Full-scale magnitude of a signed 16-bit sample.
pub const S16_SCALE: f32 = 32768.0;

const S16_MIN: f32 = -32768.0;
const S16_MAX: f32 = 32767.0;

/// Converts s16 samples to float, multiplying by `gain` on the way.
///
/// Returns the number of samples converted.
pub fn s16_to_float(output: &mut [f32], input: &[i16], gain: f32) -> usize {
    let count = output.len().min(input.len());
    let factor = gain / S16_SCALE;

    for (out, &sample) in output[..count].iter_mut().zip(input[..count].iter()) {
        *out = sample as f32 * factor;
    }

    count
}

/// Converts float samples to s16, saturating at the representable range.
///
/// Values are scaled by 32768 and truncated toward zero. NaN becomes 0.
pub fn float_to_s16(output: &mut [i16], input: &[f32]) -> usize {
    let count = output.len().min(input.len());

    for (out, &sample) in output[..count].iter_mut().zip(input[..count].iter()) {
        *out = (sample * S16_SCALE).clamp(S16_MIN, S16_MAX) as i16;
    }

    count
}

/// Multiplies every sample by `gain`.
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    for sample in buffer.iter_mut() {
        *sample *= gain;
    }
}

/// Converts a level in decibels to a linear gain factor.
pub fn db_to_gain(db: f32) -> f32 {
    libm::powf(10.0, db / 20.0)
}

/// A set of conversion routines for one code path.
#[derive(Clone, Copy)]
pub struct Converter {
    pub ident: &'static str,
    /// Extensions this path needs (any of).
    pub accel: SimdCaps,
    pub s16_to_float: fn(&mut [f32], &[i16], f32) -> usize,
    pub float_to_s16: fn(&mut [i16], &[f32]) -> usize,
    pub apply_gain: fn(&mut [f32], f32),
}

impl core::fmt::Debug for Converter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Converter")
            .field("ident", &self.ident)
            .field("accel", &self.accel)
            .finish()
    }
}

pub const SCALAR: Converter = Converter {
    ident: "scalar",
    accel: SimdCaps::empty(),
    s16_to_float,
    float_to_s16,
    apply_gain,
};

pub const F32X4: Converter = Converter {
    ident: "f32x4",
    accel: SimdCaps::F32X4,
    s16_to_float: simd::s16_to_float,
    float_to_s16: simd::float_to_s16,
    apply_gain: simd::apply_gain,
};

impl Converter {
    /// Picks the fastest conversion path the host supports.
    pub fn select(caps: SimdCaps) -> Converter {
        if caps.supports(F32X4.accel) {
            F32X4
        } else {
            SCALAR
        }
    }
}
