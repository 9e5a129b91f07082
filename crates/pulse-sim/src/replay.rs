//! Replay of recorded sensor readings

use pulse_core::{PulseError, PulseResult, SampleSource};
use std::path::Path;

/// Plays back readings captured from a real sensor, one per tick
///
/// Once the recording is exhausted every read reports the sensor as
/// unavailable, unless looping is enabled.
#[derive(Debug, Clone)]
pub struct ReplaySource {
    readings: Vec<u32>,
    position: usize,
    looping: bool,
}

impl ReplaySource {
    pub fn new(readings: Vec<u32>) -> Self {
        ReplaySource {
            readings,
            position: 0,
            looping: false,
        }
    }

    /// Parse a recording: one integer per line, `#` comments and blank lines ignored
    pub fn parse(text: &str) -> PulseResult<Self> {
        let mut readings = Vec::new();
        for (number, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let reading = line.parse::<u32>().map_err(|e| PulseError::Serialization {
                reason: format!("line {}: {:?} is not a reading: {}", number + 1, line, e),
            })?;
            readings.push(reading);
        }
        Ok(Self::new(readings))
    }

    pub fn from_file(path: impl AsRef<Path>) -> PulseResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PulseError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::parse(&text)
    }

    /// Restart from the beginning instead of failing at the end
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Readings left before the end of the recording
    pub fn remaining(&self) -> usize {
        self.readings.len() - self.position
    }

    pub fn rewind(&mut self) {
        self.position = 0;
    }
}

impl SampleSource for ReplaySource {
    fn read(&mut self) -> PulseResult<u32> {
        if self.position == self.readings.len() && self.looping {
            self.position = 0;
        }

        match self.readings.get(self.position) {
            Some(&reading) => {
                self.position += 1;
                Ok(reading)
            }
            None => Err(PulseError::SensorUnavailable {
                reason: format!("recording exhausted after {} readings", self.readings.len()),
            }),
        }
    }
}
