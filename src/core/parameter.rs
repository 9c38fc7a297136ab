use alloc::sync::Arc;
use core::sync::atomic::{AtomicU32, Ordering};

/// A thread-safe floating point parameter.
///
/// Uses atomic operations so a UI or emulation thread can adjust a value
/// (slow-motion factor, volume) that the audio thread samples once per block.
#[derive(Clone, Debug)]
pub struct Parameter {
    value: Arc<AtomicU32>,
}

impl Parameter {
    /// Creates a new Parameter with an initial value.
    pub fn new(value: f32) -> Self {
        Parameter {
            value: Arc::new(AtomicU32::new(value.to_bits())),
        }
    }

    /// Sets the parameter value.
    pub fn set(&self, value: f32) {
        self.value.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Gets the current parameter value.
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Relaxed))
    }

    /// Returns a reader that remembers the last value it saw.
    pub fn watch(&self) -> Watched {
        Watched {
            param: self.clone(),
            last: self.get().to_bits(),
        }
    }
}

/// Reader side of a [`Parameter`] that reports changes.
#[derive(Debug)]
pub struct Watched {
    param: Parameter,
    last: u32,
}

impl Watched {
    /// The value seen by the most recent [`poll`](Self::poll).
    pub fn current(&self) -> f32 {
        f32::from_bits(self.last)
    }

    /// Samples the parameter. Returns `Some(value)` if it changed.
    pub fn poll(&mut self) -> Option<f32> {
        let bits = self.param.value.load(Ordering::Relaxed);
        if bits == self.last {
            return None;
        }
        self.last = bits;
        Some(f32::from_bits(bits))
    }

    pub fn parameter(&self) -> &Parameter {
        &self.param
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_reports_changes_once() {
        let param = Parameter::new(1.0);
        let mut watched = param.watch();
        assert_eq!(watched.poll(), None);

        param.set(3.0);
        assert_eq!(watched.poll(), Some(3.0));
        assert_eq!(watched.poll(), None);
        assert_eq!(watched.current(), 3.0);
    }

    #[test]
    fn test_clones_share_value() {
        let param = Parameter::new(0.0);
        let other = param.clone();
        other.set(-6.0);
        assert_eq!(param.get(), -6.0);
    }
}
