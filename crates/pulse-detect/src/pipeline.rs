//! Signal chain for one measurement tick
//!
//! smoother → thresholder → peak detector → rate estimator, strictly in that
//! order and once per tick.

use pulse_core::{BeatEvent, Bpm, Sample, Timestamp};

use crate::config::DetectorConfig;
use crate::peak::PeakDetector;
use crate::rate::RateEstimator;
use crate::smoother::Smoother;
use crate::threshold::{AdaptiveThresholder, WindowStats};

/// What one tick of the pipeline produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    pub smoothed: Sample,
    /// Window statistics; `None` when the threshold was unavailable
    pub stats: Option<WindowStats>,
    pub beat: Option<BeatEvent>,
    pub bpm: Option<Bpm>,
}

/// Owned detector stages wired in processing order
#[derive(Debug, Clone)]
pub struct DetectionPipeline {
    smoother: Smoother,
    thresholder: AdaptiveThresholder,
    detector: PeakDetector,
    rate: RateEstimator,
}

impl DetectionPipeline {
    /// Build all stages; the first rate window starts at `now`
    pub fn new(config: &DetectorConfig, now: Timestamp) -> Self {
        DetectionPipeline {
            smoother: Smoother::new(config.smoothing_window),
            thresholder: AdaptiveThresholder::new(config.threshold_window, config.sensitivity),
            detector: PeakDetector::from_config(config),
            rate: RateEstimator::from_config(&config.rate, now),
        }
    }

    /// Run one normalised sample through every stage
    pub fn process(&mut self, sample: Sample, now: Timestamp) -> TickOutcome {
        let smoothed = self.smoother.observe(sample);
        self.thresholder.push(smoothed);

        // Detection waits until the window holds a sample
        let stats = self.thresholder.stats().ok();
        let beat = stats.and_then(|stats| self.detector.tick(smoothed, stats.threshold, now));

        if beat.is_some() {
            self.rate.on_beat();
        }
        let bpm = self.rate.tick(now);

        TickOutcome {
            smoothed,
            stats,
            beat,
            bpm,
        }
    }

    pub fn smoother(&self) -> &Smoother {
        &self.smoother
    }

    pub fn thresholder(&self) -> &AdaptiveThresholder {
        &self.thresholder
    }

    pub fn detector(&self) -> &PeakDetector {
        &self.detector
    }

    pub fn rate(&self) -> &RateEstimator {
        &self.rate
    }

    /// Start a fresh rate window without touching detection state
    pub fn restart_rate_window(&mut self, now: Timestamp) {
        self.rate.restart(now);
    }

    /// Return every stage to its startup state
    pub fn reset(&mut self, now: Timestamp) {
        self.smoother.reset();
        self.thresholder.reset();
        self.detector.reset();
        self.rate.restart(now);
    }
}
