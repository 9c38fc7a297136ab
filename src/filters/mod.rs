//! Builtin DSP filters.
//!
//! Every filter works on interleaved stereo float frames and is created
//! from a [`FilterConfig`](crate::core::config::FilterConfig) through its
//! registry descriptor.

pub mod crystalizer;
pub mod echo;
#[cfg(feature = "eq")]
pub mod eq;
pub mod panning;

use crate::core::dsp_filter::FilterDescriptor;
use crate::core::error::Error;
use crate::core::registry::{Registry, RegistryBuilder};

/// Builds the table of filters compiled into this crate.
pub fn builtin_registry() -> Result<Registry<FilterDescriptor>, Error> {
    builtin_builder().map(RegistryBuilder::build)
}

/// Builtin filters, open for further registration.
pub fn builtin_builder() -> Result<RegistryBuilder<FilterDescriptor>, Error> {
    let builder = RegistryBuilder::new()
        .register(panning::DESCRIPTOR)?
        .register(crystalizer::DESCRIPTOR)?
        .register(echo::DESCRIPTOR)?;
    #[cfg(feature = "eq")]
    let builder = builder.register(eq::DESCRIPTOR)?;
    Ok(builder)
}
