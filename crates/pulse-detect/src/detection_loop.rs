//! Fixed-rate polling loop around the detection pipeline
//!
//! The loop never blocks and never sleeps: the runner calls [`DetectionLoop::poll`]
//! as often as it likes and the loop compares the supplied timestamp against
//! its software timers. The toggle input is checked on every poll; sampling
//! happens once per measurement interval while detection is enabled.

use pulse_core::{
    AdcScale, Bpm, BpmRange, IndicatorDriver, PulseResult, SampleSource, Timestamp, ToggleEdge,
    ToggleInput,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::MonitorConfig;
use crate::pipeline::{DetectionPipeline, TickOutcome};

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PollOutcome {
    /// Detection is toggled off
    Disabled,
    /// The measurement interval has not elapsed yet
    Waiting,
    /// The sensor failed; the tick was skipped
    SensorSkipped,
    /// A sample went through the pipeline
    Measured(TickOutcome),
}

/// Counters accumulated over the lifetime of the loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopStats {
    pub polls: u64,
    pub measurements: u64,
    pub sensor_errors: u64,
    pub beats: u64,
    pub rates_emitted: u64,
    pub abnormal_rates: u64,
    pub toggles: u64,
    pub last_bpm: Option<Bpm>,
}

/// Owns every detector component and its I/O collaborators
pub struct DetectionLoop<S, T, I>
where
    S: SampleSource,
    T: ToggleInput,
    I: IndicatorDriver,
{
    source: S,
    toggle: T,
    indicator: I,
    pipeline: DetectionPipeline,
    scale: AdcScale,
    measure_interval: Duration,
    last_measure: Timestamp,
    alarm: Option<BpmRange>,
    show_values: bool,
    enabled: bool,
    stats: LoopStats,
}

impl<S, T, I> DetectionLoop<S, T, I>
where
    S: SampleSource,
    T: ToggleInput,
    I: IndicatorDriver,
{
    /// Validate `config` and wire the loop; timers start at `now`
    pub fn new(config: &MonitorConfig, source: S, toggle: T, indicator: I, now: Timestamp) -> PulseResult<Self> {
        config.validate()?;

        Ok(DetectionLoop {
            source,
            toggle,
            indicator,
            pipeline: DetectionPipeline::new(&config.detector, now),
            scale: config.adc_scale()?,
            measure_interval: config.timing.measure_interval(),
            last_measure: now,
            alarm: config.alarm,
            show_values: config.show_values,
            enabled: true,
            stats: LoopStats::default(),
        })
    }

    /// One iteration of the control loop
    pub fn poll(&mut self, now: Timestamp) -> PollOutcome {
        self.stats.polls += 1;

        if let Some(ToggleEdge::Pressed) = self.toggle.poll(now) {
            self.toggle_detection(now);
        }

        if !self.enabled {
            return PollOutcome::Disabled;
        }

        self.indicator.update(now);

        if now.saturating_since(self.last_measure) < self.measure_interval {
            return PollOutcome::Waiting;
        }
        self.last_measure = now;

        self.measure(now)
    }

    fn measure(&mut self, now: Timestamp) -> PollOutcome {
        let raw = match self.source.read() {
            Ok(raw) => raw,
            Err(err) => {
                self.stats.sensor_errors += 1;
                warn!(at = %now, error = %err, "Skipping tick");
                return PollOutcome::SensorSkipped;
            }
        };

        let outcome = self.pipeline.process(self.scale.normalize(raw), now);
        self.stats.measurements += 1;

        if self.show_values {
            debug!(
                value = outcome.smoothed,
                threshold = ?outcome.stats.map(|s| s.threshold),
                "value: {}",
                outcome.smoothed
            );
        }

        if let Some(beat) = outcome.beat {
            self.stats.beats += 1;
            self.indicator.blink(beat.at);
            info!(at = %beat.at, "Peak detected");
        }

        if let Some(bpm) = outcome.bpm {
            self.report_rate(bpm);
        }

        PollOutcome::Measured(outcome)
    }

    fn report_rate(&mut self, bpm: Bpm) {
        self.stats.rates_emitted += 1;
        self.stats.last_bpm = Some(bpm);

        let Some(range) = self.alarm else {
            info!(bpm = bpm.value(), "BPM: {}", bpm.value());
            return;
        };

        let class = range.classify(bpm);
        self.indicator.set_warning(class.is_abnormal());
        if class.is_abnormal() {
            self.stats.abnormal_rates += 1;
            warn!(bpm = bpm.value(), class = %class, "BPM is out of range");
        } else {
            info!(bpm = bpm.value(), "BPM is normal");
        }
    }

    /// Flip detection on or off
    ///
    /// Detector state is left untouched; on resume the rate window restarts so
    /// the paused time is not counted.
    pub fn toggle_detection(&mut self, now: Timestamp) {
        self.enabled = !self.enabled;
        self.stats.toggles += 1;

        if self.enabled {
            self.pipeline.restart_rate_window(now);
            info!(at = %now, "Detection resumed");
        } else {
            self.indicator.all_off();
            info!(at = %now, "Detection stopped");
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn pipeline(&self) -> &DetectionPipeline {
        &self.pipeline
    }

    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    pub fn measure_interval(&self) -> Duration {
        self.measure_interval
    }

    /// Tear the loop down, returning its collaborators
    pub fn into_parts(self) -> (S, T, I) {
        (self.source, self.toggle, self.indicator)
    }
}
