//! Error handling for the pulse detector
//!
//! Tick-level failures (`InsufficientData`, `SensorUnavailable`) are absorbed by
//! the detection loop; the remaining variants only surface at startup.

use thiserror::Error;

/// Result type alias for pulse operations
pub type PulseResult<T> = Result<T, PulseError>;

/// Error type for all pulse detector operations
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum PulseError {
    /// A rolling statistic was requested before enough samples arrived
    #[error("Insufficient data: need {required} sample(s), have {available}")]
    InsufficientData {
        /// Samples needed for the computation
        required: usize,
        /// Samples currently held
        available: usize,
    },

    /// The sample source could not produce a reading this tick
    #[error("Sensor unavailable: {reason}")]
    SensorUnavailable {
        /// Source-specific description
        reason: String,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfig {
        /// Offending field path
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// Configuration could not be (de)serialized
    #[error("Serialization error: {reason}")]
    Serialization {
        /// Underlying serializer message
        reason: String,
    },

    /// Filesystem access failed
    #[error("I/O error on {path}: {reason}")]
    Io {
        /// Path being read or written
        path: String,
        /// Underlying I/O message
        reason: String,
    },
}

impl PulseError {
    /// Whether the detection loop can simply carry on with the next tick
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            PulseError::InsufficientData { .. } | PulseError::SensorUnavailable { .. }
        )
    }
}

/// Convenience macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($field:literal, $($arg:tt)+) => {
        $crate::error::PulseError::InvalidConfig {
            field: $field,
            reason: format!($($arg)+),
        }
    };
}
