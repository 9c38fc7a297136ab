use alloc::boxed::Box;
use alloc::string::String;

/// Which plugin table an identifier was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Resampler,
    Filter,
}

impl core::fmt::Display for PluginKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PluginKind::Resampler => f.write_str("resampler"),
            PluginKind::Filter => f.write_str("DSP filter"),
        }
    }
}

/// Failure reported by an output sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    /// The device went away or was stopped.
    #[error("output sink is closed")]
    Closed,
    /// Driver specific error code.
    #[error("output device error {0}")]
    Device(i32),
}

/// Errors produced while building or running a pipeline.
///
/// Everything except `Sink` is raised at construction time. Once a
/// [`Pipeline`](crate::pipeline::Pipeline) exists, per-block processing can
/// only fail through its output sink.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{plugin}: failed to allocate working state")]
    Allocation { plugin: String },

    #[error("{plugin}: API version {found} does not match expected version {expected}")]
    VersionMismatch {
        plugin: String,
        found: u32,
        expected: u32,
    },

    #[error("no {kind} named \"{ident}\" is registered")]
    UnknownPlugin { kind: PluginKind, ident: String },

    #[error("\"{ident}\" is already registered with the same acceleration")]
    DuplicatePlugin { ident: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to initialize \"{plugin}\": {source}")]
    PluginInit {
        plugin: String,
        #[source]
        source: Box<Error>,
    },

    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl Error {
    pub(crate) fn allocation(plugin: &str) -> Self {
        Error::Allocation {
            plugin: String::from(plugin),
        }
    }

    pub(crate) fn plugin_init(plugin: &str, source: Error) -> Self {
        Error::PluginInit {
            plugin: String::from(plugin),
            source: Box::new(source),
        }
    }
}
