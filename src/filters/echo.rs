use crate::core::config::FilterConfig;
use crate::core::dsp_filter::{DspFilter, FilterDescriptor, FilterInfo, DSPFILTER_API_VERSION};
use crate::core::error::Error;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;
use alloc::vec::Vec;

const DEFAULT_DELAY_MS: f32 = 200.0;
const DEFAULT_FEEDBACK: f32 = 0.5;
const DEFAULT_AMP: f32 = 0.2;

/// One feedback delay line, stereo interleaved.
struct Tap {
    buffer: Vec<f32>,
    ptr: usize,
    feedback: f32,
}

/// A multi-tap feedback echo.
///
/// Every tap is a circular delay line. The output adds `amp` times the sum
/// of all taps to the dry signal, and each tap recirculates its own output
/// scaled by its `feedback`.
pub struct Echo {
    taps: Vec<Tap>,
    amp: f32,
}

impl Echo {
    /// Creates a new Echo.
    ///
    /// # Arguments
    /// * `sample_rate` - Stream rate in Hz.
    /// * `delays_ms` - Delay of each tap in milliseconds.
    /// * `feedback` - Feedback of each tap. Extra entries in either slice are ignored.
    /// * `amp` - Level of the summed echoes.
    pub fn new(
        sample_rate: f32,
        delays_ms: &[f32],
        feedback: &[f32],
        amp: f32,
    ) -> Result<Self, Error> {
        let count = delays_ms.len().min(feedback.len());
        let mut taps = Vec::new();
        taps.try_reserve_exact(count)
            .map_err(|_| Error::allocation("echo"))?;

        for (&ms, &fb) in delays_ms.iter().zip(feedback.iter()) {
            let frames = (libm::floorf(ms.max(0.0) * sample_rate / 1000.0 + 0.5) as usize).max(1);
            let mut buffer = Vec::new();
            buffer
                .try_reserve_exact(frames * 2)
                .map_err(|_| Error::allocation("echo"))?;
            buffer.resize(frames * 2, 0.0);
            taps.push(Tap {
                buffer,
                ptr: 0,
                feedback: fb,
            });
        }

        Ok(Echo { taps, amp })
    }

    pub fn taps(&self) -> usize {
        self.taps.len()
    }
}

impl DspFilter for Echo {
    fn process_in_place(&mut self, buffer: &mut [f32]) {
        for frame in buffer.chunks_exact_mut(2) {
            let dry = [frame[0], frame[1]];
            let mut wet = [0.0f32; 2];

            for tap in self.taps.iter_mut() {
                let at = tap.ptr * 2;
                let delayed = [tap.buffer[at], tap.buffer[at + 1]];
                wet[0] += delayed[0];
                wet[1] += delayed[1];

                tap.buffer[at] = dry[0] + delayed[0] * tap.feedback;
                tap.buffer[at + 1] = dry[1] + delayed[1] * tap.feedback;
                tap.ptr += 1;
                if tap.ptr * 2 == tap.buffer.len() {
                    tap.ptr = 0;
                }
            }

            frame[0] = dry[0] + wet[0] * self.amp;
            frame[1] = dry[1] + wet[1] * self.amp;
        }
    }

    fn reset(&mut self) {
        for tap in self.taps.iter_mut() {
            tap.buffer.fill(0.0);
            tap.ptr = 0;
        }
    }

    fn name(&self) -> &str {
        "Echo"
    }
}

fn init(info: &FilterInfo, config: &FilterConfig) -> Result<Box<dyn DspFilter>, Error> {
    let delays = config.get_float_array("delay", &[DEFAULT_DELAY_MS]);
    let feedback = config.get_float_array("feedback", &[DEFAULT_FEEDBACK]);
    let amp = config.get_float("amp", DEFAULT_AMP);
    Ok(Box::new(Echo::new(info.input_rate, &delays, &feedback, amp)?))
}

pub const DESCRIPTOR: FilterDescriptor = FilterDescriptor {
    ident: "echo",
    api_version: DSPFILTER_API_VERSION,
    accel: SimdCaps::empty(),
    init,
    config: None,
    events: None,
};
