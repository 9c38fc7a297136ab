use super::{S16_MAX, S16_MIN, S16_SCALE};
use wide::f32x4;

/// Four-lane version of [`super::s16_to_float`].
pub fn s16_to_float(output: &mut [f32], input: &[i16], gain: f32) -> usize {
    let count = output.len().min(input.len());
    let factor = gain / S16_SCALE;
    let factor_vec = f32x4::splat(factor);

    let (out_chunks, out_rem) = output[..count].as_chunks_mut::<4>();
    let (in_chunks, in_rem) = input[..count].as_chunks::<4>();

    for (out_c, in_c) in out_chunks.iter_mut().zip(in_chunks.iter()) {
        let vec = f32x4::from([
            in_c[0] as f32,
            in_c[1] as f32,
            in_c[2] as f32,
            in_c[3] as f32,
        ]);
        *out_c = (vec * factor_vec).to_array();
    }

    for (out, &sample) in out_rem.iter_mut().zip(in_rem.iter()) {
        *out = sample as f32 * factor;
    }

    count
}

/// Four-lane version of [`super::float_to_s16`].
pub fn float_to_s16(output: &mut [i16], input: &[f32]) -> usize {
    let count = output.len().min(input.len());
    let scale = f32x4::splat(S16_SCALE);
    let lo = f32x4::splat(S16_MIN);
    let hi = f32x4::splat(S16_MAX);
    let zero = f32x4::splat(0.0);

    let (out_chunks, out_rem) = output[..count].as_chunks_mut::<4>();
    let (in_chunks, in_rem) = input[..count].as_chunks::<4>();

    for (out_c, in_c) in out_chunks.iter_mut().zip(in_chunks.iter()) {
        let vec = f32x4::from(*in_c) * scale;
        // NaN lanes become 0, matching the scalar `as` cast.
        let vec = vec.is_nan().blend(zero, vec);
        let clamped = vec.max(lo).min(hi).to_array();
        *out_c = [
            clamped[0] as i16,
            clamped[1] as i16,
            clamped[2] as i16,
            clamped[3] as i16,
        ];
    }

    for (out, &sample) in out_rem.iter_mut().zip(in_rem.iter()) {
        *out = (sample * S16_SCALE).clamp(S16_MIN, S16_MAX) as i16;
    }

    count
}

/// Four-lane version of [`super::apply_gain`].
pub fn apply_gain(buffer: &mut [f32], gain: f32) {
    let gain_vec = f32x4::splat(gain);
    let (chunks, remainder) = buffer.as_chunks_mut::<4>();

    for chunk in chunks {
        let vec = f32x4::from(*chunk);
        *chunk = (vec * gain_vec).to_array();
    }

    for sample in remainder {
        *sample *= gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;

    fn noise(len: usize, seed: u32) -> Vec<f32> {
        let mut state = seed;
        (0..len)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 8) as f32 / (1u32 << 24) as f32 * 3.0 - 1.5
            })
            .collect()
    }

    #[test]
    fn test_s16_to_float_matches_scalar() {
        let input: Vec<i16> = (i16::MIN..=i16::MAX).step_by(7).collect();
        let mut a = vec![0.0f32; input.len()];
        let mut b = vec![0.0f32; input.len()];

        for gain in [1.0, 0.5, 0.7071, 1.9] {
            super::super::s16_to_float(&mut a, &input, gain);
            s16_to_float(&mut b, &input, gain);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_float_to_s16_matches_scalar() {
        let input = noise(4099, 17);
        let mut a = vec![0i16; input.len()];
        let mut b = vec![0i16; input.len()];

        super::super::float_to_s16(&mut a, &input);
        float_to_s16(&mut b, &input);
        assert_eq!(a, b);
    }

    #[test]
    fn test_float_to_s16_nan_is_silence() {
        let input = [f32::NAN, 0.5, f32::NAN, -f32::NAN, f32::NAN];
        let mut a = [1i16; 5];
        let mut b = [1i16; 5];

        super::super::float_to_s16(&mut a, &input);
        float_to_s16(&mut b, &input);
        assert_eq!(a, [0, 16384, 0, 0, 0]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_apply_gain_matches_scalar() {
        let mut a = noise(1027, 5);
        let mut b = a.clone();
        super::super::apply_gain(&mut a, 0.3);
        apply_gain(&mut b, 0.3);
        assert_eq!(a, b);
    }
}
