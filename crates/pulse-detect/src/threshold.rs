//! Adaptive decision threshold over a rolling window of smoothed samples

use pulse_core::{PulseError, PulseResult, Sample};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Summary statistics of the current window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowStats {
    pub mean: f64,
    /// Population standard deviation (divides by the window length)
    pub std_dev: f64,
    /// `mean + sensitivity * std_dev`
    pub threshold: f64,
}

/// Rolling `mean + k * stddev` threshold
///
/// Running integer sums keep push, evict and the statistics O(1) and exact;
/// the window never reallocates after construction.
#[derive(Debug, Clone)]
pub struct AdaptiveThresholder {
    window: VecDeque<Sample>,
    capacity: usize,
    sensitivity: f64,
    sum: u64,
    sum_sq: u64,
}

impl AdaptiveThresholder {
    pub fn new(capacity: usize, sensitivity: f64) -> Self {
        let capacity = capacity.max(1);
        AdaptiveThresholder {
            window: VecDeque::with_capacity(capacity + 1),
            capacity,
            sensitivity,
            sum: 0,
            sum_sq: 0,
        }
    }

    /// Append a smoothed sample, evicting the oldest once over capacity
    pub fn push(&mut self, sample: Sample) {
        let value = u64::from(sample);
        self.window.push_back(sample);
        self.sum += value;
        self.sum_sq += value * value;

        if self.window.len() > self.capacity {
            if let Some(old) = self.window.pop_front() {
                let old = u64::from(old);
                self.sum -= old;
                self.sum_sq -= old * old;
            }
        }
    }

    /// Mean, population standard deviation and threshold of the window
    pub fn stats(&self) -> PulseResult<WindowStats> {
        let n = self.window.len();
        if n == 0 {
            return Err(PulseError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let n_wide = n as u128;
        let sum = u128::from(self.sum);
        // n * sum(x^2) - (sum x)^2 is n^2 times the population variance, and
        // never negative in exact arithmetic
        let scaled_variance = n_wide * u128::from(self.sum_sq) - sum * sum;

        let mean = self.sum as f64 / n as f64;
        let variance = scaled_variance as f64 / (n_wide * n_wide) as f64;
        let std_dev = variance.sqrt();

        Ok(WindowStats {
            mean,
            std_dev,
            threshold: mean + self.sensitivity * std_dev,
        })
    }

    /// Current decision threshold; fails on an empty window
    pub fn threshold(&self) -> PulseResult<f64> {
        self.stats().map(|stats| stats.threshold)
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reset(&mut self) {
        self.window.clear();
        self.sum = 0;
        self.sum_sq = 0;
    }
}
