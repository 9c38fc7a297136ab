use crate::core::config::FilterConfig;
use crate::core::dsp_filter::{
    DspFilter, FilterDescriptor, FilterInfo, ProcessMode, DSPFILTER_API_VERSION,
};
use crate::core::error::Error;
use crate::core::ola::{Ola, SpectralProcessor};
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;
use alloc::format;
use alloc::vec::Vec;
use num_complex::Complex32;

/// Default `block_size_log2`.
pub const DEFAULT_BLOCK_SIZE_LOG2: i32 = 8;

/// Per-bin linear gains for an `N` point spectrum.
pub struct EqResponse<const N: usize> {
    gains: [f32; N],
}

impl<const N: usize> EqResponse<N> {
    /// Builds the response from `(frequency Hz, gain dB)` points.
    ///
    /// The dB curve is linear between points and flat beyond the first and
    /// last one. No points means unity gain everywhere.
    pub fn new(sample_rate: f32, points: &[(f32, f32)]) -> Self {
        let mut gains = [1.0; N];
        for k in 0..=N / 2 {
            let freq = k as f32 * sample_rate / N as f32;
            let gain = crate::convert::db_to_gain(interpolate_db(points, freq));
            gains[k] = gain;
            if k != 0 && k != N / 2 {
                gains[N - k] = gain;
            }
        }
        EqResponse { gains }
    }

    pub fn gain_at_bin(&self, bin: usize) -> f32 {
        self.gains[bin]
    }
}

impl<const N: usize> SpectralProcessor for EqResponse<N> {
    fn process_spectral(&mut self, bins: &mut [Complex32], _channel: usize) {
        for (bin, gain) in bins.iter_mut().zip(self.gains.iter()) {
            *bin *= *gain;
        }
    }
}

/// `points` must be sorted by frequency.
fn interpolate_db(points: &[(f32, f32)], freq: f32) -> f32 {
    match points {
        [] => 0.0,
        [(f0, g0), ..] if freq <= *f0 => *g0,
        [.., (fl, gl)] if freq >= *fl => *gl,
        _ => {
            for pair in points.windows(2) {
                let (f0, g0) = pair[0];
                let (f1, g1) = pair[1];
                if freq <= f1 {
                    if f1 <= f0 {
                        return g1;
                    }
                    let t = (freq - f0) / (f1 - f0);
                    return g0 + (g1 - g0) * t;
                }
            }
            0.0
        }
    }
}

enum Engine {
    N256(Box<Ola<EqResponse<256>, 256>>),
    N512(Box<Ola<EqResponse<512>, 512>>),
    N1024(Box<Ola<EqResponse<1024>, 1024>>),
}

/// FFT graphic equalizer.
///
/// Runs on overlap-added blocks of `2^block_size_log2` samples, so it emits
/// whole hops only and delays the stream by one hop.
pub struct GraphicEq {
    engine: Engine,
}

impl GraphicEq {
    pub fn new(sample_rate: f32, block_size_log2: i32, points: &[(f32, f32)]) -> Result<Self, Error> {
        let mut points: Vec<(f32, f32)> = points.to_vec();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));

        let engine = match block_size_log2 {
            8 => Engine::N256(Box::new(Ola::with(EqResponse::new(sample_rate, &points)))),
            9 => Engine::N512(Box::new(Ola::with(EqResponse::new(sample_rate, &points)))),
            10 => Engine::N1024(Box::new(Ola::with(EqResponse::new(sample_rate, &points)))),
            other => {
                return Err(Error::InvalidConfig(format!(
                    "block_size_log2 must be 8, 9 or 10, got {other}"
                )))
            }
        };

        Ok(GraphicEq { engine })
    }

    /// Frames per hop, which is also the filter's latency.
    pub fn hop(&self) -> usize {
        match self.engine {
            Engine::N256(_) => Ola::<EqResponse<256>, 256>::HOP,
            Engine::N512(_) => Ola::<EqResponse<512>, 512>::HOP,
            Engine::N1024(_) => Ola::<EqResponse<1024>, 1024>::HOP,
        }
    }
}

impl DspFilter for GraphicEq {
    fn mode(&self) -> ProcessMode {
        ProcessMode::Buffered
    }

    fn process_buffered(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        match &mut self.engine {
            Engine::N256(ola) => ola.process(input, output),
            Engine::N512(ola) => ola.process(input, output),
            Engine::N1024(ola) => ola.process(input, output),
        }
    }

    fn max_output_frames(&self, input_frames: usize) -> usize {
        let hop = self.hop();
        (input_frames + hop - 1) / hop * hop
    }

    fn reset(&mut self) {
        match &mut self.engine {
            Engine::N256(ola) => ola.reset(),
            Engine::N512(ola) => ola.reset(),
            Engine::N1024(ola) => ola.reset(),
        }
    }

    fn latency_frames(&self) -> usize {
        self.hop()
    }

    fn name(&self) -> &str {
        "Eq"
    }
}

fn init(info: &FilterInfo, config: &FilterConfig) -> Result<Box<dyn DspFilter>, Error> {
    let frequencies = config.get_float_array("frequencies", &[]);
    let gains = config.get_float_array("gains", &[]);
    let block_size_log2 = config.get_int("block_size_log2", DEFAULT_BLOCK_SIZE_LOG2);

    let points: Vec<(f32, f32)> = frequencies.into_iter().zip(gains).collect();
    Ok(Box::new(GraphicEq::new(info.input_rate, block_size_log2, &points)?))
}

pub const DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    ident: "eq",
    api_version: DSPFILTER_API_VERSION,
    accel: SimdCaps::empty(),
    init,
    config: None,
    events: None,
};

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_interpolation_clamps_and_blends() {
        let points = [(100.0, -6.0), (1000.0, 6.0)];
        assert_eq!(interpolate_db(&points, 10.0), -6.0);
        assert_eq!(interpolate_db(&points, 5000.0), 6.0);
        assert!((interpolate_db(&points, 550.0) - 0.0).abs() < 1e-5);
        assert_eq!(interpolate_db(&[], 440.0), 0.0);
    }

    #[test]
    fn test_response_is_mirrored() {
        let response = EqResponse::<256>::new(48000.0, &[(0.0, -20.0), (24000.0, 0.0)]);
        assert!((response.gain_at_bin(0) - 0.1).abs() < 1e-5);
        assert!((response.gain_at_bin(128) - 1.0).abs() < 1e-5);
        for k in 1..128 {
            assert_eq!(response.gain_at_bin(k), response.gain_at_bin(256 - k));
        }
    }

    #[test]
    fn test_flat_eq_passes_signal_after_one_hop() {
        let mut eq = GraphicEq::new(48000.0, 8, &[]).unwrap();
        let hop = eq.hop();
        assert_eq!(eq.latency_frames(), hop);

        let frames = 512;
        let mut input = vec![0.0f32; frames * 2];
        for i in 0..frames {
            input[2 * i] = libm::sinf(i as f32 * 0.1);
            input[2 * i + 1] = 0.25;
        }
        let mut output = vec![0.0f32; eq.max_output_frames(frames) * 2];
        let written = eq.process_buffered(&input, &mut output);
        assert_eq!(written, frames);

        for k in hop..frames {
            assert!((output[2 * k] - input[2 * (k - hop)]).abs() < 1e-4);
        }
    }

    #[test]
    fn test_output_is_whole_hops() {
        let mut eq = GraphicEq::new(44100.0, 9, &[]).unwrap();
        let input = vec![0.0f32; 300 * 2];
        let mut output = vec![0.0f32; eq.max_output_frames(300) * 2];
        assert_eq!(eq.max_output_frames(300), 512);
        assert_eq!(eq.process_buffered(&input, &mut output), 256);
        assert_eq!(eq.process_buffered(&input, &mut output), 256);
    }

    #[test]
    fn test_rejects_unsupported_block_size() {
        let config = FilterConfig::new().with_int_array("block_size_log2", &[12]);
        let result = (DESCRIPTOR.init)(&FilterInfo { input_rate: 48000.0 }, &config);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }
}
