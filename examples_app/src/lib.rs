pub mod audio_backend;

/// Routes `log` output through a `RUST_LOG`-style filter, `info` by default.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// A stereo test tone as an emulated core would produce it.
pub struct ToneCore {
    phase: f32,
    step: f32,
}

impl ToneCore {
    pub fn new(freq: f32, sample_rate: f32) -> Self {
        ToneCore {
            phase: 0.0,
            step: freq / sample_rate,
        }
    }

    /// Fills `out` with interleaved s16 frames.
    pub fn render(&mut self, out: &mut [i16]) {
        for frame in out.chunks_exact_mut(2) {
            let v = libm::sinf(2.0 * std::f32::consts::PI * self.phase) * 12000.0;
            frame[0] = v as i16;
            frame[1] = (v * 0.5) as i16;
            self.phase = (self.phase + self.step).fract();
        }
    }
}
