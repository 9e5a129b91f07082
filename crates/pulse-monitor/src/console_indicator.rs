//! Indicator lines rendered as log events

use pulse_core::IndicatorOutput;
use tracing::{debug, warn};

/// Stands in for the beat LED and alarm light on a development machine
#[derive(Debug, Default)]
pub struct ConsoleIndicator {
    pulse: bool,
    alarm: bool,
    flashes: u64,
}

#[cfg(test)]
impl ConsoleIndicator {
    pub fn flashes(&self) -> u64 {
        self.flashes
    }

    pub fn alarm(&self) -> bool {
        self.alarm
    }
}

impl IndicatorOutput for ConsoleIndicator {
    fn set_pulse(&mut self, on: bool) {
        if on == self.pulse {
            return;
        }
        self.pulse = on;
        if on {
            self.flashes += 1;
        }
        debug!(on, "pulse LED");
    }

    fn set_alarm(&mut self, on: bool) {
        if on == self.alarm {
            return;
        }
        self.alarm = on;
        if on {
            warn!("Alarm light on");
        } else {
            debug!("Alarm light off");
        }
    }
}
