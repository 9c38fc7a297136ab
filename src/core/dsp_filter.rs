use crate::core::config::FilterConfig;
use crate::core::error::{Error, PluginKind};
use crate::core::registry::Plugin;
use crate::core::simd::SimdCaps;
use alloc::boxed::Box;

/// Version of the DSP filter plugin interface.
pub const DSPFILTER_API_VERSION: u32 = 1;

/// How a filter wants its buffers wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessMode {
    /// Output overwrites the input buffer. Same frame count in and out.
    InPlace,
    /// Reads the input buffer and fills a separate output buffer. The frame
    /// count may differ from the input's.
    Buffered,
}

/// Stream properties handed to a filter's `init`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterInfo {
    /// Sample rate of the stream the filter runs on, in Hz.
    pub input_rate: f32,
}

/// The core trait for DSP filters.
///
/// Filters work on interleaved stereo float frames. The orchestrator looks
/// at [`mode`](Self::mode) before wiring a filter: only `InPlace` filters
/// are ever handed an aliased buffer.
pub trait DspFilter: Send {
    fn mode(&self) -> ProcessMode {
        ProcessMode::InPlace
    }

    /// Processes `buffer` in place. Called only for `InPlace` filters.
    fn process_in_place(&mut self, _buffer: &mut [f32]) {}

    /// Reads `input` and writes to `output`, returning frames written.
    ///
    /// The default copies and then runs [`process_in_place`](Self::process_in_place),
    /// so any in-place filter can also be driven this way.
    fn process_buffered(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        let samples = input.len().min(output.len()) & !1;
        output[..samples].copy_from_slice(&input[..samples]);
        self.process_in_place(&mut output[..samples]);
        samples / 2
    }

    /// Largest frame count one call can return for `input_frames`.
    fn max_output_frames(&self, input_frames: usize) -> usize {
        input_frames
    }

    /// Clears any signal history.
    fn reset(&mut self) {}

    /// Returns the latency of the filter in frames.
    fn latency_frames(&self) -> usize {
        0
    }

    /// Returns the name of the filter.
    fn name(&self) -> &str;
}

impl<T: DspFilter + ?Sized> DspFilter for Box<T> {
    fn mode(&self) -> ProcessMode {
        (**self).mode()
    }

    fn process_in_place(&mut self, buffer: &mut [f32]) {
        (**self).process_in_place(buffer);
    }

    fn process_buffered(&mut self, input: &[f32], output: &mut [f32]) -> usize {
        (**self).process_buffered(input, output)
    }

    fn max_output_frames(&self, input_frames: usize) -> usize {
        (**self).max_output_frames(input_frames)
    }

    fn reset(&mut self) {
        (**self).reset();
    }

    fn latency_frames(&self) -> usize {
        (**self).latency_frames()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

pub type FilterInit = fn(&FilterInfo, &FilterConfig) -> Result<Box<dyn DspFilter>, Error>;

/// Optional per-filter hook (interactive config surface, UI event pump).
pub type FilterHook = fn(&mut dyn DspFilter);

/// Registry entry for a DSP filter implementation.
#[derive(Clone, Copy)]
pub struct FilterDescriptor {
    pub ident: &'static str,
    pub api_version: u32,
    pub accel: SimdCaps,
    pub init: FilterInit,
    pub config: Option<FilterHook>,
    pub events: Option<FilterHook>,
}

impl FilterDescriptor {
    /// Runs `init`, tagging any failure with this filter's ident.
    pub fn instantiate(
        &self,
        info: &FilterInfo,
        config: &FilterConfig,
    ) -> Result<Box<dyn DspFilter>, Error> {
        (self.init)(info, config).map_err(|e| Error::plugin_init(self.ident, e))
    }
}

impl Plugin for FilterDescriptor {
    const API_VERSION: u32 = DSPFILTER_API_VERSION;
    const KIND: PluginKind = PluginKind::Filter;

    fn api_version(&self) -> u32 {
        self.api_version
    }

    fn ident(&self) -> &str {
        self.ident
    }

    fn accel(&self) -> SimdCaps {
        self.accel
    }
}
