//! Moving-average smoothing of raw sensor samples

use pulse_core::Sample;

/// Fixed-size ring buffer moving average
///
/// The ring starts zero-filled, so the first `N - 1` outputs are pulled toward
/// zero. Downstream stages tolerate this warm-up skew.
#[derive(Debug, Clone)]
pub struct Smoother {
    ring: Box<[Sample]>,
    index: usize,
    observed: usize,
}

impl Smoother {
    /// Create a smoother averaging the last `window_size` samples
    ///
    /// A zero window is promoted to one (pass-through).
    pub fn new(window_size: usize) -> Self {
        Smoother {
            ring: vec![0; window_size.max(1)].into_boxed_slice(),
            index: 0,
            observed: 0,
        }
    }

    /// Store `raw` in the next slot and return the truncated mean of the ring
    pub fn observe(&mut self, raw: Sample) -> Sample {
        self.ring[self.index] = raw;
        self.index = (self.index + 1) % self.ring.len();
        self.observed = self.observed.saturating_add(1);

        let sum: u64 = self.ring.iter().map(|&s| u64::from(s)).sum();
        // Mean of u16 values always fits in u16
        (sum / self.ring.len() as u64) as Sample
    }

    pub fn window_size(&self) -> usize {
        self.ring.len()
    }

    /// Whether every slot holds a real sample
    pub fn is_warmed_up(&self) -> bool {
        self.observed >= self.ring.len()
    }

    /// Zero the ring and restart warm-up
    pub fn reset(&mut self) {
        self.ring.fill(0);
        self.index = 0;
        self.observed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input_converges_once_full() {
        let mut smoother = Smoother::new(4);
        let outputs: Vec<Sample> = (0..4).map(|_| smoother.observe(1_000)).collect();
        assert_eq!(outputs, vec![250, 500, 750, 1_000]);
        assert!(smoother.is_warmed_up());
        assert_eq!(smoother.observe(1_000), 1_000);
    }

    #[test]
    fn test_truncating_mean() {
        let mut smoother = Smoother::new(4);
        for raw in [1, 2, 3] {
            smoother.observe(raw);
        }
        // (1 + 2 + 3 + 3) / 4 = 2.25
        assert_eq!(smoother.observe(3), 2);
    }

    #[test]
    fn test_oldest_sample_is_overwritten() {
        let mut smoother = Smoother::new(2);
        smoother.observe(100);
        smoother.observe(200);
        assert_eq!(smoother.observe(400), 300);
    }

    #[test]
    fn test_full_scale_does_not_overflow() {
        let mut smoother = Smoother::new(4);
        for _ in 0..4 {
            smoother.observe(Sample::MAX);
        }
        assert_eq!(smoother.observe(Sample::MAX), Sample::MAX);
    }

    #[test]
    fn test_zero_window_passes_through() {
        let mut smoother = Smoother::new(0);
        assert_eq!(smoother.window_size(), 1);
        assert_eq!(smoother.observe(42), 42);
    }

    #[test]
    fn test_reset() {
        let mut smoother = Smoother::new(4);
        for _ in 0..8 {
            smoother.observe(800);
        }
        smoother.reset();
        assert!(!smoother.is_warmed_up());
        assert_eq!(smoother.observe(800), 200);
    }
}
