use crate::core::config::FilterConfig;
use crate::core::dsp_filter::{DspFilter, FilterDescriptor, FilterHook, FilterInfo, ProcessMode};
use crate::core::error::Error;
use crate::core::registry::Registry;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;
use alloc::vec::Vec;
use log::debug;

struct Stage {
    filter: Box<dyn DspFilter>,
    config: Option<FilterHook>,
    events: Option<FilterHook>,
}

/// A chain of DSP filters.
///
/// Processes audio sequentially through a list of filters in the order they
/// were added. In-place filters work on the current buffer; buffered filters
/// write into the spare buffer, after which the two swap roles.
pub struct FilterChain {
    stages: Vec<Stage>,
    sample_rate: f32,
}

impl FilterChain {
    /// Creates an empty chain for a stream at `sample_rate`.
    pub fn new(sample_rate: f32) -> Self {
        FilterChain {
            stages: Vec::new(),
            sample_rate,
        }
    }

    /// Instantiates `specs` in order from `registry`.
    ///
    /// Fails on the first filter that is unknown or refuses to initialize;
    /// nothing is returned half built.
    pub fn from_registry<'a>(
        registry: &Registry<FilterDescriptor>,
        caps: SimdCaps,
        sample_rate: f32,
        specs: impl IntoIterator<Item = (&'a str, &'a FilterConfig)>,
    ) -> Result<Self, Error> {
        let info = FilterInfo {
            input_rate: sample_rate,
        };
        let mut chain = FilterChain::new(sample_rate);

        for (ident, config) in specs {
            let descriptor = registry.get_implementation(ident, caps)?;
            let filter = descriptor.instantiate(&info, config)?;
            debug!("Filter \"{}\" added ({:?})", ident, filter.mode());
            chain.stages.push(Stage {
                filter,
                config: descriptor.config,
                events: descriptor.events,
            });
        }

        Ok(chain)
    }

    /// Appends a filter to the chain.
    pub fn and(mut self, filter: impl DspFilter + 'static) -> Self {
        self.push(Box::new(filter));
        self
    }

    /// Appends an already boxed filter.
    pub fn push(&mut self, filter: Box<dyn DspFilter>) {
        self.stages.push(Stage {
            filter,
            config: None,
            events: None,
        });
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.filter.name()).collect()
    }

    /// Largest buffer, in frames, any stage needs for `input_frames` of input.
    pub fn peak_frames(&self, input_frames: usize) -> usize {
        let mut frames = input_frames;
        let mut peak = input_frames;
        for stage in &self.stages {
            frames = stage.filter.max_output_frames(frames);
            peak = peak.max(frames);
        }
        peak
    }

    /// Runs every filter over the first `frames` frames of `current`.
    ///
    /// Both buffers must hold at least [`peak_frames`](Self::peak_frames)
    /// frames. Returns the buffer holding the result and its frame count.
    pub fn process<'a>(
        &mut self,
        mut current: &'a mut [f32],
        mut spare: &'a mut [f32],
        mut frames: usize,
    ) -> (&'a mut [f32], usize) {
        for stage in &mut self.stages {
            match stage.filter.mode() {
                ProcessMode::InPlace => {
                    stage.filter.process_in_place(&mut current[..frames * 2]);
                }
                ProcessMode::Buffered => {
                    let produced = stage
                        .filter
                        .process_buffered(&current[..frames * 2], spare)
                        .min(spare.len() / 2);
                    core::mem::swap(&mut current, &mut spare);
                    frames = produced;
                }
            }
        }

        (current, frames)
    }

    /// Calls every filter's `events` hook, if it has one.
    pub fn pump_events(&mut self) {
        for stage in &mut self.stages {
            if let Some(events) = stage.events {
                events(stage.filter.as_mut());
            }
        }
    }

    /// Opens the configuration surface of filter `index`. Returns false if
    /// the filter has none.
    pub fn open_config(&mut self, index: usize) -> bool {
        match self.stages.get_mut(index) {
            Some(Stage {
                filter,
                config: Some(config),
                ..
            }) => {
                config(filter.as_mut());
                true
            }
            _ => false,
        }
    }

    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            stage.filter.reset();
        }
    }

    /// Total latency of the chain in frames.
    pub fn latency_frames(&self) -> usize {
        self.stages.iter().map(|s| s.filter.latency_frames()).sum()
    }
}
