//! Fixed-capacity rolling sample window.

use ringbuf::{traits::*, HeapRb};

/// Rolling window of f64 samples, oldest-out when full.
///
/// The session runtime keeps one window per metric (pace, cadence,
/// heart rate), pushed in lockstep so indices stay aligned across
/// windows.
pub struct SampleWindow {
    ring: HeapRb<f64>,
}

impl std::fmt::Debug for SampleWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleWindow")
            .field("len", &self.ring.occupied_len())
            .field("capacity", &self.ring.capacity())
            .finish()
    }
}

impl SampleWindow {
    /// Create a window holding at most `capacity` samples
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self {
            ring: HeapRb::new(capacity.max(1)),
        }
    }

    /// Push a sample, evicting the oldest when full
    #[inline]
    pub fn push(&mut self, value: f64) {
        if self.ring.is_full() {
            let _ = self.ring.try_pop();
        }
        let _ = self.ring.try_push(value);
    }

    /// Number of samples currently held
    #[inline]
    pub fn len(&self) -> usize {
        self.ring.occupied_len()
    }

    /// Whether the window holds no samples
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }

    /// Snapshot the samples in insertion order (oldest first)
    #[inline]
    pub fn values(&self) -> Vec<f64> {
        self.ring.iter().copied().collect()
    }

    /// Drop all samples
    #[inline]
    pub fn clear(&mut self) {
        self.ring.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_order() {
        let mut window = SampleWindow::new(5);
        for v in [1.0, 2.0, 3.0] {
            window.push(v);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.values(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_oldest_out_when_full() {
        let mut window = SampleWindow::new(3);
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            window.push(v);
        }
        assert_eq!(window.len(), 3);
        assert_eq!(window.values(), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_clear() {
        let mut window = SampleWindow::new(3);
        window.push(1.0);
        window.push(2.0);
        window.clear();
        assert!(window.is_empty());
        window.push(7.0);
        assert_eq!(window.values(), vec![7.0]);
    }
}
