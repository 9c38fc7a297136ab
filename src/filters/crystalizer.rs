use crate::core::config::FilterConfig;
use crate::core::dsp_filter::{DspFilter, FilterDescriptor, FilterInfo, DSPFILTER_API_VERSION};
use crate::core::error::Error;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;

/// Default `intensity`.
pub const DEFAULT_INTENSITY: f32 = 5.0;

/// Transient emphasis ("crystalizer").
///
/// Adds the sample-to-sample delta back onto the signal:
/// `out = cur + (cur - prev) * intensity`, with `prev` tracking the
/// unprocessed input per channel.
pub struct Crystalizer {
    intensity: f32,
    prev: [f32; 2],
}

impl Crystalizer {
    pub fn new(intensity: f32) -> Self {
        Crystalizer {
            intensity,
            prev: [0.0; 2],
        }
    }
}

impl DspFilter for Crystalizer {
    fn process_in_place(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            for (sample, prev) in frame.iter_mut().zip(self.prev.iter_mut()) {
                let cur = *sample;
                *sample = cur + (cur - *prev) * self.intensity;
                *prev = cur;
            }
        }
    }

    fn reset(&mut self) {
        self.prev = [0.0; 2];
    }

    fn name(&self) -> &str {
        "Crystalizer"
    }
}

fn init(_info: &FilterInfo, config: &FilterConfig) -> Result<Box<dyn DspFilter>, Error> {
    let intensity = config.get_float("intensity", DEFAULT_INTENSITY);
    Ok(Box::new(Crystalizer::new(intensity)))
}

pub const DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    ident: "crystalizer",
    api_version: DSPFILTER_API_VERSION,
    accel: SimdCaps::empty(),
    init,
    config: None,
    events: None,
};
