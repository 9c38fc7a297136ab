use crate::core::error::Error;
use alloc::vec::Vec;

/// Storage format of a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SampleFormat {
    /// Signed 16-bit integer, full scale at +/-32768.
    S16,
    /// 32-bit float, full scale at +/-1.0.
    #[default]
    F32,
}

impl SampleFormat {
    #[inline(always)]
    pub fn sample_size(self) -> usize {
        match self {
            SampleFormat::S16 => core::mem::size_of::<i16>(),
            SampleFormat::F32 => core::mem::size_of::<f32>(),
        }
    }
}

enum Storage {
    S16(Vec<i16>),
    F32(Vec<f32>),
}

/// An owned buffer of interleaved samples with a fixed frame capacity.
///
/// The storage is reserved once when the block is created and never grows.
/// `frames` marks how much of it currently holds valid audio, so
/// `byte_len() == frames * channels * sample_size` at all times.
pub struct SampleBlock {
    storage: Storage,
    channels: usize,
    frames: usize,
    capacity: usize,
}

impl SampleBlock {
    /// Allocates a zeroed block able to hold `max_frames` frames.
    ///
    /// Uses a fallible reservation so an oversized request surfaces as
    /// [`Error::Allocation`] instead of aborting.
    pub fn with_capacity(
        format: SampleFormat,
        channels: usize,
        max_frames: usize,
        owner: &str,
    ) -> Result<Self, Error> {
        let samples = max_frames
            .checked_mul(channels)
            .ok_or_else(|| Error::allocation(owner))?;

        let storage = match format {
            SampleFormat::S16 => Storage::S16(zeroed(samples, owner)?),
            SampleFormat::F32 => Storage::F32(zeroed(samples, owner)?),
        };

        Ok(SampleBlock {
            storage,
            channels,
            frames: 0,
            capacity: max_frames,
        })
    }

    pub fn format(&self) -> SampleFormat {
        match self.storage {
            Storage::S16(_) => SampleFormat::S16,
            Storage::F32(_) => SampleFormat::F32,
        }
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Number of valid frames.
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Maximum number of frames the block can hold.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Marks `frames` frames as valid, clamped to the capacity.
    pub fn set_frames(&mut self, frames: usize) -> usize {
        self.frames = frames.min(self.capacity);
        self.frames
    }

    pub fn byte_len(&self) -> usize {
        self.frames * self.channels * self.format().sample_size()
    }

    /// The valid float samples, if this is a float block.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match &self.storage {
            Storage::F32(v) => Some(&v[..self.frames * self.channels]),
            Storage::S16(_) => None,
        }
    }

    /// The whole float storage, ignoring the valid frame count.
    pub fn f32_storage_mut(&mut self) -> Option<&mut [f32]> {
        match &mut self.storage {
            Storage::F32(v) => Some(v.as_mut_slice()),
            Storage::S16(_) => None,
        }
    }

    /// The whole s16 storage, ignoring the valid frame count.
    pub fn s16_storage_mut(&mut self) -> Option<&mut [i16]> {
        match &mut self.storage {
            Storage::S16(v) => Some(v.as_mut_slice()),
            Storage::F32(_) => None,
        }
    }

    /// The valid samples as raw native-endian bytes, ready for a sink.
    pub fn as_bytes(&self) -> &[u8] {
        let samples = self.frames * self.channels;
        match &self.storage {
            Storage::S16(v) => bytemuck::cast_slice(&v[..samples]),
            Storage::F32(v) => bytemuck::cast_slice(&v[..samples]),
        }
    }
}

fn zeroed<T: Copy + Default>(len: usize, owner: &str) -> Result<Vec<T>, Error> {
    let mut v = Vec::new();
    v.try_reserve_exact(len)
        .map_err(|_| Error::allocation(owner))?;
    v.resize(len, T::default());
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_length_invariant() {
        let mut block = SampleBlock::with_capacity(SampleFormat::S16, 2, 64, "test").unwrap();
        block.set_frames(10);
        assert_eq!(block.byte_len(), 10 * 2 * 2);
        assert_eq!(block.as_bytes().len(), block.byte_len());

        let mut block = SampleBlock::with_capacity(SampleFormat::F32, 2, 64, "test").unwrap();
        block.set_frames(10);
        assert_eq!(block.byte_len(), 10 * 2 * 4);
        assert_eq!(block.as_bytes().len(), block.byte_len());
    }

    #[test]
    fn test_set_frames_clamps() {
        let mut block = SampleBlock::with_capacity(SampleFormat::F32, 2, 8, "test").unwrap();
        assert_eq!(block.set_frames(100), 8);
        assert_eq!(block.as_f32().unwrap().len(), 16);
    }

    #[test]
    fn test_format_accessors() {
        let mut block = SampleBlock::with_capacity(SampleFormat::F32, 2, 4, "test").unwrap();
        assert!(block.s16_storage_mut().is_none());
        assert_eq!(block.f32_storage_mut().unwrap().len(), 8);
        assert_eq!(block.format(), SampleFormat::F32);
    }

    #[test]
    fn test_oversized_allocation_fails() {
        let result = SampleBlock::with_capacity(SampleFormat::F32, 2, usize::MAX / 2, "huge");
        assert!(matches!(result, Err(Error::Allocation { .. })));
    }
}
