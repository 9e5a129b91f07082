//! Pre-defined heart-rate patterns for pulse simulation

use pulse_core::{PulseError, PulseResult};
use serde::{Deserialize, Serialize};

/// How the simulated beat rate evolves over time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BeatPattern {
    /// Constant rate
    Steady { bpm: f64 },
    /// Linear change from `start_bpm` to `end_bpm`, then constant
    Ramp {
        start_bpm: f64,
        end_bpm: f64,
        duration_secs: f64,
    },
    /// Each interval deviates from the nominal one by up to `jitter` (fraction)
    Irregular { bpm: f64, jitter: f64 },
    /// No beats at all
    Flatline,
}

impl BeatPattern {
    /// Nominal rate at `time` seconds; `None` when no beats are produced
    pub fn rate_at(&self, time: f64) -> Option<f64> {
        match *self {
            BeatPattern::Steady { bpm } | BeatPattern::Irregular { bpm, .. } => Some(bpm),

            BeatPattern::Ramp {
                start_bpm,
                end_bpm,
                duration_secs,
            } => {
                if time >= duration_secs {
                    Some(end_bpm)
                } else {
                    Some(start_bpm + (end_bpm - start_bpm) * (time / duration_secs))
                }
            }

            BeatPattern::Flatline => None,
        }
    }

    /// Maximum fractional deviation of a single beat interval
    pub fn jitter(&self) -> f64 {
        match *self {
            BeatPattern::Irregular { jitter, .. } => jitter,
            _ => 0.0,
        }
    }

    pub fn validate(&self) -> PulseResult<()> {
        let positive = |bpm: f64| bpm.is_finite() && bpm > 0.0;
        let valid = match *self {
            BeatPattern::Steady { bpm } => positive(bpm),
            BeatPattern::Ramp {
                start_bpm,
                end_bpm,
                duration_secs,
            } => positive(start_bpm) && positive(end_bpm) && duration_secs.is_finite() && duration_secs > 0.0,
            BeatPattern::Irregular { bpm, jitter } => positive(bpm) && (0.0..1.0).contains(&jitter),
            BeatPattern::Flatline => true,
        };

        if valid {
            Ok(())
        } else {
            Err(PulseError::InvalidConfig {
                field: "pattern",
                reason: format!("{:?} is not a usable beat pattern", self),
            })
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            BeatPattern::Steady { .. } => "Steady rhythm",
            BeatPattern::Ramp { .. } => "Gradual rate change",
            BeatPattern::Irregular { .. } => "Irregular rhythm",
            BeatPattern::Flatline => "No pulse",
        }
    }

    /// Common scenarios, named for the CLI and tests
    pub fn presets() -> Vec<(&'static str, BeatPattern)> {
        vec![
            ("resting", BeatPattern::Steady { bpm: 70.0 }),
            ("bradycardia", BeatPattern::Steady { bpm: 42.0 }),
            ("tachycardia", BeatPattern::Steady { bpm: 120.0 }),
            (
                "exercise",
                BeatPattern::Ramp {
                    start_bpm: 70.0,
                    end_bpm: 130.0,
                    duration_secs: 60.0,
                },
            ),
            (
                "recovery",
                BeatPattern::Ramp {
                    start_bpm: 130.0,
                    end_bpm: 75.0,
                    duration_secs: 90.0,
                },
            ),
            ("arrhythmia", BeatPattern::Irregular { bpm: 75.0, jitter: 0.3 }),
            ("flatline", BeatPattern::Flatline),
        ]
    }

    /// Look up a preset by name
    pub fn preset(name: &str) -> Option<BeatPattern> {
        Self::presets()
            .into_iter()
            .find(|(preset, _)| preset.eq_ignore_ascii_case(name))
            .map(|(_, pattern)| pattern)
    }
}

impl Default for BeatPattern {
    fn default() -> Self {
        BeatPattern::Steady { bpm: 70.0 }
    }
}
