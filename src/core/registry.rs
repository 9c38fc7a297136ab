use crate::core::error::{Error, PluginKind};
use crate::core::simd::SimdCaps;
use alloc::string::String;
use alloc::vec::Vec;
use log::{debug, error};

/// Common surface of a plugin descriptor.
///
/// The API version is the first thing the registry looks at; a descriptor
/// whose version differs from `API_VERSION` is rejected before any other
/// field is read.
pub trait Plugin {
    /// Version this build of the crate speaks.
    const API_VERSION: u32;
    const KIND: PluginKind;

    fn api_version(&self) -> u32;

    /// Identifier used for selection by configuration.
    fn ident(&self) -> &str;

    /// Extensions this variant needs (any of). Empty for scalar code.
    fn accel(&self) -> SimdCaps {
        SimdCaps::empty()
    }
}

/// Collects descriptors before the registry is frozen.
pub struct RegistryBuilder<D> {
    entries: Vec<D>,
}

impl<D: Plugin> RegistryBuilder<D> {
    pub fn new() -> Self {
        RegistryBuilder {
            entries: Vec::new(),
        }
    }

    /// Adds a descriptor.
    ///
    /// Fails with [`Error::VersionMismatch`] if the descriptor was built
    /// against another API version, or [`Error::DuplicatePlugin`] if the same
    /// ident is already present with the same acceleration.
    pub fn register(mut self, descriptor: D) -> Result<Self, Error> {
        let found = descriptor.api_version();
        if found != D::API_VERSION {
            error!(
                "Rejecting {} \"{}\": API version {} (expected {})",
                D::KIND,
                descriptor.ident(),
                found,
                D::API_VERSION
            );
            return Err(Error::VersionMismatch {
                plugin: String::from(descriptor.ident()),
                found,
                expected: D::API_VERSION,
            });
        }

        let duplicate = self
            .entries
            .iter()
            .any(|e| e.ident() == descriptor.ident() && e.accel() == descriptor.accel());
        if duplicate {
            return Err(Error::DuplicatePlugin {
                ident: String::from(descriptor.ident()),
            });
        }

        debug!(
            "Registered {} \"{}\" (accel {:?})",
            D::KIND,
            descriptor.ident(),
            descriptor.accel()
        );
        self.entries.push(descriptor);
        Ok(self)
    }

    pub fn build(self) -> Registry<D> {
        Registry {
            entries: self.entries,
        }
    }
}

impl<D: Plugin> Default for RegistryBuilder<D> {
    fn default() -> Self {
        Self::new()
    }
}

/// An immutable table of plugin descriptors.
///
/// Several variants may share an ident (for example a scalar and a SIMD
/// build of the same resampler). Lookup picks the one best suited to the
/// capability mask it is given.
pub struct Registry<D> {
    entries: Vec<D>,
}

impl<D: Plugin> Registry<D> {
    /// Selects the implementation of `ident` for a host with `caps`.
    ///
    /// Among the variants the host can run, the one needing the most
    /// extensions wins; the scalar variant is the fallback.
    pub fn get_implementation(&self, ident: &str, caps: SimdCaps) -> Result<&D, Error> {
        let chosen = self
            .entries
            .iter()
            .filter(|d| d.ident() == ident && caps.supports(d.accel()))
            .max_by_key(|d| d.accel().bits().count_ones());

        match chosen {
            Some(d) => {
                debug!("Selected {} \"{}\" (accel {:?})", D::KIND, ident, d.accel());
                Ok(d)
            }
            None => Err(Error::UnknownPlugin {
                kind: D::KIND,
                ident: String::from(ident),
            }),
        }
    }

    /// Distinct identifiers in registration order.
    pub fn idents(&self) -> Vec<&str> {
        let mut idents: Vec<&str> = Vec::new();
        for d in &self.entries {
            if !idents.contains(&d.ident()) {
                idents.push(d.ident());
            }
        }
        idents
    }

    pub fn iter(&self) -> impl Iterator<Item = &D> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
