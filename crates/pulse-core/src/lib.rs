//! Pulse-Core: foundation types for the biosignal beat detector
//!
//! Timestamps and clocks, sample/beat/rate types, the error taxonomy and the
//! traits through which the detector reaches its sensor and indicators.

pub mod error;
pub mod io;
pub mod pulse_types;
pub mod timestamp;

pub use error::{PulseError, PulseResult};
pub use io::*;
pub use pulse_types::*;
pub use timestamp::{Clock, ManualClock, MonotonicClock, Timestamp};
