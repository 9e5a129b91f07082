//! Sample, beat and rate types shared by the detector and its collaborators

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{PulseError, PulseResult};
use crate::timestamp::Timestamp;

/// One normalised sensor reading (16-bit full scale)
pub type Sample = u16;

/// Scaling of raw ADC readings to the 16-bit sample range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdcScale {
    bits: u8,
}

impl AdcScale {
    /// Native 16-bit readings, passed through unchanged
    pub const NATIVE_16: AdcScale = AdcScale { bits: 16 };

    /// Scale for an ADC with the given resolution
    pub fn new(bits: u8) -> PulseResult<Self> {
        if !(1..=16).contains(&bits) {
            return Err(PulseError::InvalidConfig {
                field: "adc_bits",
                reason: format!("ADC resolution must be 1-16 bits, got {}", bits),
            });
        }
        Ok(AdcScale { bits })
    }

    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Largest raw reading the ADC can produce
    pub fn full_scale(&self) -> u32 {
        (1u32 << self.bits) - 1
    }

    /// Left-shift a raw reading into the 16-bit range, saturating
    ///
    /// A 12-bit reading of 4095 becomes 65520, matching a plain `* 16`.
    pub fn normalize(&self, raw: u32) -> Sample {
        let shifted = u64::from(raw) << (16 - u32::from(self.bits));
        Sample::try_from(shifted).unwrap_or(Sample::MAX)
    }
}

impl Default for AdcScale {
    fn default() -> Self {
        Self::NATIVE_16
    }
}

/// A detected beat; carries only the instant it was claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BeatEvent {
    pub at: Timestamp,
}

impl BeatEvent {
    pub fn new(at: Timestamp) -> Self {
        Self { at }
    }
}

/// Beats per minute over one rate window
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Bpm(pub u32);

impl Bpm {
    pub fn value(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Bpm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} BPM", self.0)
    }
}

/// Classification of a BPM value against the normal range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateClass {
    Low,
    Normal,
    High,
}

impl RateClass {
    pub fn is_abnormal(&self) -> bool {
        !matches!(self, RateClass::Normal)
    }
}

impl fmt::Display for RateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateClass::Low => write!(f, "low"),
            RateClass::Normal => write!(f, "normal"),
            RateClass::High => write!(f, "high"),
        }
    }
}

/// Inclusive range of BPM values considered normal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmRange {
    pub low: u32,
    pub high: u32,
}

impl BpmRange {
    /// Resting range used by the alarm indicator: below 50 or above 90 is abnormal
    pub const RESTING: BpmRange = BpmRange { low: 50, high: 90 };

    pub fn new(low: u32, high: u32) -> PulseResult<Self> {
        let range = BpmRange { low, high };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> PulseResult<()> {
        if self.low > self.high {
            return Err(PulseError::InvalidConfig {
                field: "alarm",
                reason: format!("low bound {} exceeds high bound {}", self.low, self.high),
            });
        }
        Ok(())
    }

    pub fn classify(&self, bpm: Bpm) -> RateClass {
        if bpm.0 < self.low {
            RateClass::Low
        } else if bpm.0 > self.high {
            RateClass::High
        } else {
            RateClass::Normal
        }
    }
}

impl Default for BpmRange {
    fn default() -> Self {
        Self::RESTING
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_twelve_bit_scaling() {
        let scale = AdcScale::new(12).unwrap();
        assert_eq!(scale.full_scale(), 4095);
        assert_eq!(scale.normalize(4095), 65520);
        assert_eq!(scale.normalize(1), 16);
    }

    #[test]
    fn test_native_scale_saturates() {
        let scale = AdcScale::NATIVE_16;
        assert_eq!(scale.normalize(1234), 1234);
        assert_eq!(scale.normalize(70_000), Sample::MAX);
    }

    #[test]
    fn test_invalid_resolution() {
        assert!(AdcScale::new(0).is_err());
        assert!(AdcScale::new(17).is_err());
    }

    #[test]
    fn test_resting_range_classification() {
        let range = BpmRange::RESTING;
        assert_eq!(range.classify(Bpm(49)), RateClass::Low);
        assert_eq!(range.classify(Bpm(50)), RateClass::Normal);
        assert_eq!(range.classify(Bpm(90)), RateClass::Normal);
        assert_eq!(range.classify(Bpm(91)), RateClass::High);
        assert!(range.classify(Bpm(0)).is_abnormal());
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(BpmRange::new(90, 50).is_err());
    }
}
