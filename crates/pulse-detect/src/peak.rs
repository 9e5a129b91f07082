//! Rising/falling edge peak detector with cooldown and hysteresis
//!
//! One call to [`PeakDetector::tick`] per measurement. The rules run in a
//! fixed order:
//!
//! 1. Cooldown gate: within `cooldown` of the last beat nothing happens,
//!    not even the `last_value` update.
//! 2. Arm: a sample above the threshold moves `Idle` to `Rising`.
//! 3. Claim: while `Rising`, the first decrease after `min_beat_interval`
//!    is a beat (the previous sample was a local maximum).
//! 4. Re-arm: a sample below `threshold - hysteresis_margin` returns to
//!    `Idle` and allows the next excursion to claim a beat.
//! 5. Remember the sample as `last_value`.

use pulse_core::{BeatEvent, Sample, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DetectorConfig;

/// Excursion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorPhase {
    /// Waiting for the signal to cross the threshold
    Idle,
    /// Above threshold, looking for the local maximum
    Rising,
}

/// Complete detector state, exposed for inspection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectorState {
    pub phase: DetectorPhase,
    pub peak_claimed: bool,
    pub last_value: Sample,
    pub last_beat: Option<Timestamp>,
}

impl Default for DetectorState {
    fn default() -> Self {
        DetectorState {
            phase: DetectorPhase::Idle,
            peak_claimed: false,
            last_value: 0,
            last_beat: None,
        }
    }
}

/// Beat detector state machine
#[derive(Debug, Clone)]
pub struct PeakDetector {
    state: DetectorState,
    min_beat_interval: Duration,
    cooldown: Duration,
    hysteresis_margin: f64,
}

impl PeakDetector {
    pub fn new(min_beat_interval: Duration, cooldown: Duration, hysteresis_margin: u16) -> Self {
        PeakDetector {
            state: DetectorState::default(),
            min_beat_interval,
            cooldown,
            hysteresis_margin: f64::from(hysteresis_margin),
        }
    }

    pub fn from_config(config: &DetectorConfig) -> Self {
        Self::new(config.min_beat_interval(), config.cooldown(), config.hysteresis_margin)
    }

    /// Advance the state machine by one smoothed sample
    pub fn tick(&mut self, value: Sample, threshold: f64, now: Timestamp) -> Option<BeatEvent> {
        // A beat that has never happened satisfies every time guard
        let since_beat = self.state.last_beat.map(|last| now.saturating_since(last));

        if matches!(since_beat, Some(elapsed) if elapsed < self.cooldown) {
            return None;
        }

        let level = f64::from(value);

        if level > threshold && self.state.phase == DetectorPhase::Idle {
            self.state.phase = DetectorPhase::Rising;
        }

        let mut beat = None;
        if self.state.phase == DetectorPhase::Rising
            && value < self.state.last_value
            && !self.state.peak_claimed
            && since_beat.map_or(true, |elapsed| elapsed >= self.min_beat_interval)
        {
            self.state.last_beat = Some(now);
            self.state.peak_claimed = true;
            beat = Some(BeatEvent::new(now));
        }

        if level < threshold - self.hysteresis_margin {
            self.state.phase = DetectorPhase::Idle;
            self.state.peak_claimed = false;
        }

        self.state.last_value = value;
        beat
    }

    pub fn state(&self) -> &DetectorState {
        &self.state
    }

    pub fn last_beat(&self) -> Option<Timestamp> {
        self.state.last_beat
    }

    /// Forget the current excursion and beat history
    pub fn reset(&mut self) {
        self.state = DetectorState::default();
    }
}
