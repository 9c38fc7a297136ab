use super::config::WritePolicy;
use crate::core::error::SinkError;
use alloc::vec::Vec;

/// Where the pipeline hands finished audio.
///
/// Implemented by the host's output driver. `write` may accept fewer bytes
/// than offered; the pipeline applies its [`WritePolicy`] to the rest.
pub trait OutputSink {
    /// Writes raw interleaved samples, returning how many bytes were taken.
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError>;

    /// Free space in the device buffer, in bytes, if the driver reports it.
    fn write_avail(&self) -> Option<usize> {
        None
    }

    /// Total device buffer size in bytes, if the driver reports it.
    fn buffer_size(&self) -> Option<usize> {
        None
    }
}

impl<S: OutputSink + ?Sized> OutputSink for &mut S {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        (**self).write(data)
    }

    fn write_avail(&self) -> Option<usize> {
        (**self).write_avail()
    }

    fn buffer_size(&self) -> Option<usize> {
        (**self).buffer_size()
    }
}

/// Collects everything written. Grows without bound.
impl OutputSink for Vec<u8> {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        self.extend_from_slice(data);
        Ok(data.len())
    }
}

/// Accepts and discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl OutputSink for NullSink {
    fn write(&mut self, data: &[u8]) -> Result<usize, SinkError> {
        Ok(data.len())
    }
}

/// Writes `data`, applying `policy` to partial writes.
///
/// Returns the number of bytes that were dropped.
pub(crate) fn write_with_policy(
    sink: &mut dyn OutputSink,
    mut data: &[u8],
    policy: WritePolicy,
) -> Result<usize, SinkError> {
    let mut retries = match policy {
        WritePolicy::Retry { attempts } => attempts,
        WritePolicy::Drop => 0,
    };

    loop {
        let written = sink.write(data)?.min(data.len());
        data = &data[written..];
        if data.is_empty() {
            return Ok(0);
        }
        if retries == 0 {
            return Ok(data.len());
        }
        retries -= 1;
    }
}
