use crate::core::config::FilterConfig;
use crate::core::dsp_filter::{
    DspFilter, FilterDescriptor, FilterInfo, ProcessMode, DSPFILTER_API_VERSION,
};
use crate::core::error::Error;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;

const DEFAULT_LEFT: [f32; 2] = [1.0, 0.0];
const DEFAULT_RIGHT: [f32; 2] = [0.0, 1.0];

/// A stereo panning mix matrix.
///
/// Each frame is transformed as
/// `L' = L * left_mix[0] + R * left_mix[1]` and
/// `R' = L * right_mix[0] + R * right_mix[1]`.
/// The identity matrix is detected at init and leaves samples untouched.
pub struct Panning {
    left: [f32; 2],
    right: [f32; 2],
    identity: bool,
}

impl Panning {
    /// Creates a new Panning filter.
    ///
    /// # Arguments
    /// * `left` - Contribution of (L, R) to the left output.
    /// * `right` - Contribution of (L, R) to the right output.
    pub fn new(left: [f32; 2], right: [f32; 2]) -> Self {
        Panning {
            left,
            right,
            identity: left == DEFAULT_LEFT && right == DEFAULT_RIGHT,
        }
    }

    /// Reads `left_mix` and `right_mix`. A missing key, or an array that is
    /// not exactly two long, yields the identity row.
    pub fn from_config(config: &FilterConfig) -> Self {
        let row = |key: &str, default: [f32; 2]| {
            let values = config.get_float_array(key, &default);
            match values.as_slice() {
                [a, b] => [*a, *b],
                _ => default,
            }
        };
        Self::new(row("left_mix", DEFAULT_LEFT), row("right_mix", DEFAULT_RIGHT))
    }
}

impl DspFilter for Panning {
    fn mode(&self) -> ProcessMode {
        ProcessMode::InPlace
    }

    fn process_in_place(&mut self, buffer: &mut [f32]) {
        if self.identity {
            return;
        }

        for frame in buffer.chunks_exact_mut(2) {
            let l = frame[0];
            let r = frame[1];
            frame[0] = l * self.left[0] + r * self.left[1];
            frame[1] = l * self.right[0] + r * self.right[1];
        }
    }

    fn name(&self) -> &str {
        "Panning"
    }
}

fn init(_info: &FilterInfo, config: &FilterConfig) -> Result<Box<dyn DspFilter>, Error> {
    Ok(Box::new(Panning::from_config(config)))
}

pub const DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    ident: "panning",
    api_version: DSPFILTER_API_VERSION,
    accel: SimdCaps::empty(),
    init,
    config: None,
    events: None,
};
