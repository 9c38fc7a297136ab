use super::{
    ResampleRequest, Resampler, ResamplerDescriptor, ResamplerQuality, RESAMPLER_API_VERSION,
};
use crate::core::config::FilterConfig;
use crate::core::error::Error;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;
use wide::f32x4;

/// How the cubic is evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernel {
    Scalar,
    /// Both channels in one four-lane vector.
    F32x4,
}

/// Cubic Hermite (Catmull-Rom) interpolating resampler.
///
/// Keeps the last four input frames per channel and evaluates the spline
/// between the middle two at the current fractional position. Output at an
/// integer position is exactly the stored input sample, so at a ratio of 1.0
/// the input is reproduced, delayed by [`LATENCY_FRAMES`].
///
/// History survives ratio changes, so a new ratio continues smoothly.
pub struct Hermite {
    /// `history[slot] = [left, right]`, oldest slot first.
    history: [[f32; 2]; 4],
    fraction: f64,
    /// The first frame of the next request is already in `history`.
    pending: bool,
    kernel: Kernel,
}

/// Delay, in input frames, between a frame entering and being reproduced.
pub const LATENCY_FRAMES: usize = 2;

impl Hermite {
    pub fn new(kernel: Kernel) -> Self {
        Hermite {
            history: [[0.0; 2]; 4],
            fraction: 0.0,
            pending: false,
            kernel,
        }
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    #[inline]
    fn push(&mut self, frame: &[f32]) {
        self.history.copy_within(1.., 0);
        self.history[3] = [frame[0], frame[1]];
    }

    #[inline]
    fn interpolate(&self, t: f32) -> [f32; 2] {
        match self.kernel {
            Kernel::Scalar => {
                let [prev, a, b, next] = self.history;
                [
                    cubic(prev[0], a[0], b[0], next[0], t),
                    cubic(prev[1], a[1], b[1], next[1], t),
                ]
            }
            Kernel::F32x4 => {
                let lanes = |slot: [f32; 2]| f32x4::from([slot[0], slot[1], 0.0, 0.0]);
                let val_prev = lanes(self.history[0]);
                let val_a = lanes(self.history[1]);
                let val_b = lanes(self.history[2]);
                let val_next = lanes(self.history[3]);
                let frac = f32x4::splat(t);

                let c0 = val_a;
                let c1 = f32x4::splat(0.5) * (val_b - val_prev);
                let c2 = val_prev - f32x4::splat(2.5) * val_a + f32x4::splat(2.0) * val_b
                    - f32x4::splat(0.5) * val_next;
                let c3 = f32x4::splat(0.5) * (val_next - val_prev)
                    + f32x4::splat(1.5) * (val_a - val_b);

                let out = (((c3 * frac + c2) * frac + c1) * frac + c0).to_array();
                [out[0], out[1]]
            }
        }
    }
}

#[inline(always)]
fn cubic(val_prev: f32, val_a: f32, val_b: f32, val_next: f32, frac: f32) -> f32 {
    let c0 = val_a;
    let c1 = 0.5 * (val_b - val_prev);
    let c2 = val_prev - 2.5 * val_a + 2.0 * val_b - 0.5 * val_next;
    let c3 = 0.5 * (val_next - val_prev) + 1.5 * (val_a - val_b);
    ((c3 * frac + c2) * frac + c1) * frac + c0
}

impl Resampler for Hermite {
    fn process(&mut self, request: &mut ResampleRequest<'_>) {
        request.frames_consumed = 0;
        request.frames_produced = 0;

        let Some(step) = request.step() else {
            return;
        };

        let input = request.input;
        let in_frames = request.input_frames();
        let capacity = request.output_capacity();
        let mut consumed = 0;
        let mut produced = 0;

        'input: while consumed < in_frames {
            if !self.pending {
                self.push(&input[consumed * 2..consumed * 2 + 2]);
                self.pending = true;
            }

            while self.fraction < 1.0 {
                if produced == capacity {
                    break 'input;
                }
                let frame = self.interpolate(self.fraction as f32);
                request.output[produced * 2] = frame[0];
                request.output[produced * 2 + 1] = frame[1];
                produced += 1;
                self.fraction += step;
            }

            self.fraction -= 1.0;
            self.pending = false;
            consumed += 1;
        }

        request.frames_consumed = consumed;
        request.frames_produced = produced;
    }

    fn reset(&mut self) {
        self.history = [[0.0; 2]; 4];
        self.fraction = 0.0;
        self.pending = false;
    }

    fn ident(&self) -> &str {
        "hermite"
    }

    fn latency_frames(&self) -> usize {
        LATENCY_FRAMES
    }
}

fn init_scalar(
    _config: &FilterConfig,
    _bandwidth_mod: f64,
    _quality: ResamplerQuality,
    _caps: SimdCaps,
) -> Result<Box<dyn Resampler>, Error> {
    Ok(Box::new(Hermite::new(Kernel::Scalar)))
}

fn init_f32x4(
    _config: &FilterConfig,
    _bandwidth_mod: f64,
    _quality: ResamplerQuality,
    _caps: SimdCaps,
) -> Result<Box<dyn Resampler>, Error> {
    Ok(Box::new(Hermite::new(Kernel::F32x4)))
}

pub const DESCRIPTOR: ResamplerDescriptor = ResamplerDescriptor {
    ident: "hermite",
    api_version: RESAMPLER_API_VERSION,
    accel: SimdCaps::empty(),
    init: init_scalar,
};

pub const DESCRIPTOR_F32X4: ResamplerDescriptor = ResamplerDescriptor {
    ident: "hermite",
    api_version: RESAMPLER_API_VERSION,
    accel: SimdCaps::F32X4,
    init: init_f32x4,
};
