pub mod channels;
pub mod config;
pub mod dsp_chain;
pub mod dsp_filter;
pub mod error;
#[cfg(feature = "eq")]
pub mod ola;
pub mod parameter;
pub mod registry;
pub mod sample_block;
pub mod simd;
