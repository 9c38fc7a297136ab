/// Channel layout of a sample stream.
///
/// Everything past the decode stage is interleaved stereo; mono sources are
/// up-channelled to dual mono first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Channels {
    Mono,
    #[default]
    Stereo,
}

impl Channels {
    #[inline(always)]
    pub fn count(self) -> usize {
        match self {
            Channels::Mono => 1,
            Channels::Stereo => 2,
        }
    }
}

/// Duplicates each mono sample into both halves of a stereo frame.
///
/// Returns the number of frames written, limited by the smaller buffer.
pub fn upmix_mono(output: &mut [f32], input: &[f32]) -> usize {
    let frames = input.len().min(output.len() / 2);

    for (frame, &sample) in output.chunks_exact_mut(2).zip(input[..frames].iter()) {
        frame[0] = sample;
        frame[1] = sample;
    }

    frames
}

/// Keeps the left channel of each stereo frame.
///
/// Dual-mono streams carry the same signal on both sides so no mixing is
/// needed. Returns the number of frames written.
pub fn downmix_left(output: &mut [f32], input: &[f32]) -> usize {
    let frames = (input.len() / 2).min(output.len());

    for (out, frame) in output[..frames].iter_mut().zip(input.chunks_exact(2)) {
        *out = frame[0];
    }

    frames
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upmix_duplicates() {
        let input = [0.25, -0.5, 1.0];
        let mut output = [0.0; 6];
        assert_eq!(upmix_mono(&mut output, &input), 3);
        assert_eq!(output, [0.25, 0.25, -0.5, -0.5, 1.0, 1.0]);
    }

    #[test]
    fn test_upmix_clamps_to_output() {
        let input = [1.0, 2.0, 3.0];
        let mut output = [0.0; 4];
        assert_eq!(upmix_mono(&mut output, &input), 2);
        assert_eq!(output, [1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_downmix_left_inverts_upmix() {
        let input = [0.1, 0.2, 0.3, 0.4];
        let mut stereo = [0.0; 8];
        let mut mono = [0.0; 4];
        upmix_mono(&mut stereo, &input);
        assert_eq!(downmix_left(&mut mono, &stereo), 4);
        assert_eq!(mono, input);
    }
}
