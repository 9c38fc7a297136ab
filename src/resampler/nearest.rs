use super::{
    ResampleRequest, Resampler, ResamplerDescriptor, ResamplerQuality, RESAMPLER_API_VERSION,
};
use crate::core::config::FilterConfig;
use crate::core::error::Error;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;

/// Nearest-neighbour (sample-and-hold) resampler.
///
/// Repeats or skips input frames according to a fractional position that
/// advances by `1 / ratio` per output frame. Aliases badly; it exists as the
/// cheapest baseline. At a ratio of exactly 1.0 the output is the input.
pub struct Nearest {
    fraction: f64,
}

impl Nearest {
    pub fn new() -> Self {
        Nearest { fraction: 0.0 }
    }
}

impl Default for Nearest {
    fn default() -> Self {
        Self::new()
    }
}

impl Resampler for Nearest {
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
            let frame = &input[consumed * 2..consumed * 2 + 2];

            while self.fraction < 1.0 {
                if produced == capacity {
                    break 'input;
                }
                request.output[produced * 2] = frame[0];
                request.output[produced * 2 + 1] = frame[1];
                produced += 1;
                self.fraction += step;
            }

            self.fraction -= 1.0;
            consumed += 1;
        }

        request.frames_consumed = consumed;
        request.frames_produced = produced;
    }

    fn reset(&mut self) {
        self.fraction = 0.0;
    }

    fn ident(&self) -> &str {
        "nearest"
    }
}

fn init(
    _config: &FilterConfig,
    _bandwidth_mod: f64,
    _quality: ResamplerQuality,
    _caps: SimdCaps,
) -> Result<Box<dyn Resampler>, Error> {
    Ok(Box::new(Nearest::new()))
}

pub const DESCRIPTOR: ResamplerDescriptor = ResamplerDescriptor {
    ident: "nearest",
    api_version: RESAMPLER_API_VERSION,
    accel: SimdCaps::empty(),
    init,
};
