//! Beats-per-minute estimation over fixed windows

use pulse_core::{Bpm, Timestamp};
use std::time::Duration;

use crate::config::{RateConfig, RateNormalization};

/// Counts beats and converts each completed window to BPM
#[derive(Debug, Clone)]
pub struct RateEstimator {
    window: Duration,
    normalization: RateNormalization,
    beat_count: u32,
    window_start: Timestamp,
}

impl RateEstimator {
    pub fn new(window: Duration, normalization: RateNormalization, now: Timestamp) -> Self {
        RateEstimator {
            window,
            normalization,
            beat_count: 0,
            window_start: now,
        }
    }

    pub fn from_config(config: &RateConfig, now: Timestamp) -> Self {
        Self::new(config.window(), config.normalization, now)
    }

    pub fn on_beat(&mut self) {
        self.beat_count = self.beat_count.saturating_add(1);
    }

    /// Emit BPM once the window has elapsed, then start a new window at `now`
    pub fn tick(&mut self, now: Timestamp) -> Option<Bpm> {
        let elapsed = now.saturating_since(self.window_start);
        if elapsed < self.window || elapsed.is_zero() {
            return None;
        }

        let bpm = match self.normalization {
            RateNormalization::Proportional => {
                let elapsed_ms = elapsed.as_millis().max(1);
                let per_minute = u128::from(self.beat_count) * 60_000 / elapsed_ms;
                u32::try_from(per_minute).unwrap_or(u32::MAX)
            }
            RateNormalization::FixedMultiplier(factor) => self.beat_count.saturating_mul(factor),
        };

        self.restart(now);
        Some(Bpm(bpm))
    }

    /// Discard the partial window and start counting again at `now`
    pub fn restart(&mut self, now: Timestamp) {
        self.beat_count = 0;
        self.window_start = now;
    }

    pub fn beat_count(&self) -> u32 {
        self.beat_count
    }

    pub fn window_start(&self) -> Timestamp {
        self.window_start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(40);

    /// Drive the estimator at 25Hz with a beat every `beat_every` ticks
    fn run(estimator: &mut RateEstimator, ticks: u64, beat_every: u64) -> Vec<Bpm> {
        let mut emitted = Vec::new();
        for i in 1..=ticks {
            if i % beat_every == 0 {
                estimator.on_beat();
            }
            let now = Timestamp::ZERO.saturating_add(TICK * i as u32);
            emitted.extend(estimator.tick(now));
        }
        emitted
    }

    #[test]
    fn test_nothing_before_window_elapses() {
        let mut estimator = RateEstimator::new(Duration::from_secs(10), RateNormalization::Proportional, Timestamp::ZERO);
        estimator.on_beat();
        assert_eq!(estimator.tick(Timestamp::from_millis(9_999)), None);
        assert_eq!(estimator.beat_count(), 1);
    }

    #[test]
    fn test_proportional_normalization() {
        let mut estimator = RateEstimator::new(Duration::from_secs(10), RateNormalization::Proportional, Timestamp::ZERO);
        for _ in 0..12 {
            estimator.on_beat();
        }
        assert_eq!(estimator.tick(Timestamp::from_millis(10_000)), Some(Bpm(72)));
        assert_eq!(estimator.beat_count(), 0);
        assert_eq!(estimator.window_start(), Timestamp::from_millis(10_000));
    }

    #[test]
    fn test_proportional_uses_actual_elapsed_time() {
        let mut estimator = RateEstimator::new(Duration::from_secs(10), RateNormalization::Proportional, Timestamp::ZERO);
        for _ in 0..12 {
            estimator.on_beat();
        }
        // 12 * 60000 / 10040 = 71.7, truncated
        assert_eq!(estimator.tick(Timestamp::from_millis(10_040)), Some(Bpm(71)));
    }

    #[test]
    fn test_fixed_multiplier() {
        let mut estimator = RateEstimator::new(Duration::from_secs(30), RateNormalization::FixedMultiplier(2), Timestamp::ZERO);
        for _ in 0..35 {
            estimator.on_beat();
        }
        assert_eq!(estimator.tick(Timestamp::from_secs(30)), Some(Bpm(70)));
    }

    #[test]
    fn test_constant_rate_is_normalized_to_a_minute() {
        // One beat per second (every 25 ticks) for 60 seconds
        let mut estimator = RateEstimator::new(Duration::from_secs(10), RateNormalization::Proportional, Timestamp::ZERO);
        let emitted = run(&mut estimator, 1_500, 25);
        assert_eq!(emitted.len(), 6);
        for bpm in emitted {
            assert!((59..=60).contains(&bpm.value()), "got {}", bpm);
        }
    }

    #[test]
    fn test_windows_restart_on_emission() {
        // One beat per second over two minutes of 30s windows
        let mut estimator = RateEstimator::new(Duration::from_secs(30), RateNormalization::FixedMultiplier(2), Timestamp::ZERO);
        let emitted = run(&mut estimator, 3_000, 25);
        assert_eq!(emitted.len(), 4);
        assert!(emitted.iter().all(|bpm| bpm.value() == 60));
    }

    #[test]
    fn test_restart_discards_partial_window() {
        let mut estimator = RateEstimator::new(Duration::from_secs(10), RateNormalization::Proportional, Timestamp::ZERO);
        estimator.on_beat();
        estimator.restart(Timestamp::from_secs(4));
        assert_eq!(estimator.beat_count(), 0);
        assert_eq!(estimator.tick(Timestamp::from_secs(10)), None);
        assert_eq!(estimator.tick(Timestamp::from_secs(14)), Some(Bpm(0)));
    }
}
