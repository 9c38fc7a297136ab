use core::f32::consts::PI;
use num_complex::Complex32;

/// Trait for processors that operate on spectral data (FFT bins).
pub trait SpectralProcessor {
    /// Process a block of complex spectral bins for one channel.
    ///
    /// # Arguments
    /// * `bins` - The full (two sided) spectrum of a real signal.
    /// * `channel` - 0 for left, 1 for right.
    fn process_spectral(&mut self, bins: &mut [Complex32], channel: usize);
}

/// Helper trait to abstract FFT operations for different sizes.
pub trait FftHelper {
    fn do_fft(&mut self);
    fn do_ifft(&mut self);
}

macro_rules! impl_fft_helper {
    ($n:literal, $cfft:path) => {
        impl FftHelper for [Complex32; $n] {
            fn do_fft(&mut self) {
                let _ = $cfft(self);
            }
            fn do_ifft(&mut self) {
                for x in self.iter_mut() {
                    *x = x.conj();
                }
                let _ = $cfft(self);
                for x in self.iter_mut() {
                    *x = x.conj() / $n as f32;
                }
            }
        }
    };
}

impl_fft_helper!(256, microfft::complex::cfft_256);
impl_fft_helper!(512, microfft::complex::cfft_512);
impl_fft_helper!(1024, microfft::complex::cfft_1024);

/// Stereo Overlap-Add (OLA) block processor.
///
/// Collects interleaved stereo input into half-overlapping frames of `N`
/// samples, windows them with a periodic Hann window, runs the spectral
/// processor per channel and overlap-adds the result. Output is produced one
/// hop (`N / 2` frames) at a time, so a call returns a multiple of the hop
/// and the stream is delayed by one hop.
///
/// All state is fixed-size; processing never allocates.
pub struct Ola<P: SpectralProcessor, const N: usize> {
    processor: P,
    window: [f32; N],
    input: [[f32; N]; 2],
    ola: [[f32; N]; 2],
    fill: usize,
    fft_buffer: [Complex32; N],
}

impl<P: SpectralProcessor, const N: usize> Ola<P, N>
where
    [Complex32; N]: FftHelper,
{
    pub const HOP: usize = N / 2;

    /// Creates a new OLA processor.
    ///
    /// # Arguments
    /// * `processor` - The spectral processor to apply.
    pub fn with(processor: P) -> Self {
        let mut window = [0.0; N];
        for (i, w) in window.iter_mut().enumerate() {
            let arg = 2.0 * PI * i as f32 / N as f32;
            *w = 0.5 * (1.0 - libm::cosf(arg));
        }

        Ola {
            processor,
            window,
            input: [[0.0; N]; 2],
            ola: [[0.0; N]; 2],
            fill: 0,
            fft_buffer: [Complex32::new(0.0, 0.0); N],
        }
    }

    pub fn processor(&self) -> &P {
        &self.processor
    }

    /// Upper bound on the frames one call can emit for `input_frames`.
    pub fn max_output_frames(input_frames: usize) -> usize {
        (input_frames + Self::HOP - 1) / Self::HOP * Self::HOP
    }

    /// Feeds interleaved stereo `input` and writes completed hops to `output`.
    ///
    /// Returns the number of frames written. Hops that do not fit in
    /// `output` are discarded.
    pub fn process(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        let hop = Self::HOP;
        let out_capacity = output.len() / 2;
        let mut written = 0;

        for frame in input.chunks_exact(2) {
            self.input[0][N - hop + self.fill] = frame[0];
            self.input[1][N - hop + self.fill] = frame[1];
            self.fill += 1;

            if self.fill < hop {
                continue;
            }
            self.fill = 0;

            for ch in 0..2 {
                self.analyze(ch);
            }

            if written + hop <= out_capacity {
                let out = &mut output[written * 2..(written + hop) * 2];
                for (i, frame) in out.chunks_exact_mut(2).enumerate() {
                    frame[0] = self.ola[0][i];
                    frame[1] = self.ola[1][i];
                }
                written += hop;
            }

            for ch in 0..2 {
                self.ola[ch].copy_within(hop.., 0);
                self.ola[ch][N - hop..].fill(0.0);
                self.input[ch].copy_within(hop.., 0);
            }
        }

        written
    }

    fn analyze(&mut self, ch: usize) {
        for i in 0..N {
            self.fft_buffer[i] = Complex32::new(self.input[ch][i] * self.window[i], 0.0);
        }

        self.fft_buffer.do_fft();
        self.processor.process_spectral(&mut self.fft_buffer, ch);
        self.fft_buffer.do_ifft();

        for i in 0..N {
            self.ola[ch][i] += self.fft_buffer[i].re;
        }
    }

    pub fn reset(&mut self) {
        self.input = [[0.0; N]; 2];
        self.ola = [[0.0; N]; 2];
        self.fill = 0;
    }
}
