#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

pub mod convert;
pub mod core;
pub mod filters;
pub mod pipeline;
pub mod resampler;

pub use crate::core::channels::Channels;
pub use crate::core::config::{ConfigValue, FilterConfig};
pub use crate::core::dsp_chain::FilterChain;
pub use crate::core::dsp_filter::{DspFilter, FilterDescriptor, ProcessMode, DSPFILTER_API_VERSION};
pub use crate::core::error::{Error, SinkError};
pub use crate::core::sample_block::{SampleBlock, SampleFormat};
pub use crate::core::simd::SimdCaps;
pub use crate::pipeline::{OutputSink, Pipeline, PipelineConfig};
pub use crate::resampler::{ResampleRequest, Resampler, ResamplerDescriptor, RESAMPLER_API_VERSION};
