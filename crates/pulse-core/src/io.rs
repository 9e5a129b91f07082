//! Seams to the hardware shim: sensor, toggle button and indicators
//!
//! Pin binding and LED drivers live outside this workspace. What is portable
//! (debouncing, blink timing, alarm latching) is implemented here on top of
//! minimal traits a board support layer can satisfy.

use std::time::Duration;

use crate::error::PulseResult;
use crate::timestamp::Timestamp;

/// Instantaneous analog sensor
pub trait SampleSource {
    /// Read one raw ADC value; must not block
    fn read(&mut self) -> PulseResult<u32>;
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn read(&mut self) -> PulseResult<u32> {
        (**self).read()
    }
}

/// Level of a digital input, already corrected for pull-up inversion
pub trait DigitalInput {
    fn is_active(&mut self) -> bool;
}

/// Debounced edge reported by a toggle input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleEdge {
    Pressed,
    Released,
}

/// Edge-detected input polled on every loop iteration
pub trait ToggleInput {
    fn poll(&mut self, now: Timestamp) -> Option<ToggleEdge>;
}

impl<T: ToggleInput + ?Sized> ToggleInput for Box<T> {
    fn poll(&mut self, now: Timestamp) -> Option<ToggleEdge> {
        (**self).poll(now)
    }
}

/// Toggle input for deployments without a button
#[derive(Debug, Clone, Copy, Default)]
pub struct NoToggle;

impl ToggleInput for NoToggle {
    fn poll(&mut self, _now: Timestamp) -> Option<ToggleEdge> {
        None
    }
}

/// Software debounce over a raw digital input
///
/// An edge is only reported once more than `interval` has passed since the
/// previously reported edge.
pub struct DebouncedToggle<D: DigitalInput> {
    input: D,
    interval: Duration,
    last_state: bool,
    last_edge: Timestamp,
}

impl<D: DigitalInput> DebouncedToggle<D> {
    pub fn new(mut input: D, interval: Duration, now: Timestamp) -> Self {
        let last_state = input.is_active();
        Self {
            input,
            interval,
            last_state,
            last_edge: now,
        }
    }
}

impl<D: DigitalInput> ToggleInput for DebouncedToggle<D> {
    fn poll(&mut self, now: Timestamp) -> Option<ToggleEdge> {
        let current = self.input.is_active();
        if now.saturating_since(self.last_edge) <= self.interval || current == self.last_state {
            return None;
        }

        self.last_state = current;
        self.last_edge = now;
        Some(if current {
            ToggleEdge::Pressed
        } else {
            ToggleEdge::Released
        })
    }
}

/// Raw indicator lines: the beat LED and the alarm light
pub trait IndicatorOutput {
    fn set_pulse(&mut self, on: bool);
    fn set_alarm(&mut self, on: bool);
}

/// Visual feedback for beats and abnormal rates
pub trait IndicatorDriver {
    /// Light the beat indicator; it is switched off later by `update`
    fn blink(&mut self, now: Timestamp);
    /// Switch the beat indicator off once its on-time has elapsed
    fn update(&mut self, now: Timestamp);
    fn set_warning(&mut self, abnormal: bool);
    fn all_off(&mut self);
}

impl<I: IndicatorDriver + ?Sized> IndicatorDriver for Box<I> {
    fn blink(&mut self, now: Timestamp) {
        (**self).blink(now)
    }
    fn update(&mut self, now: Timestamp) {
        (**self).update(now)
    }
    fn set_warning(&mut self, abnormal: bool) {
        (**self).set_warning(abnormal)
    }
    fn all_off(&mut self) {
        (**self).all_off()
    }
}

/// Non-blocking blink timing over an [`IndicatorOutput`]
pub struct BlinkIndicator<O: IndicatorOutput> {
    output: O,
    on_time: Duration,
    lit_at: Option<Timestamp>,
    abnormal: bool,
}

impl<O: IndicatorOutput> BlinkIndicator<O> {
    pub fn new(output: O, on_time: Duration) -> Self {
        Self {
            output,
            on_time,
            lit_at: None,
            abnormal: false,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit_at.is_some()
    }

    pub fn is_abnormal(&self) -> bool {
        self.abnormal
    }

    pub fn output(&self) -> &O {
        &self.output
    }

    fn pulse_off(&mut self) {
        self.output.set_pulse(false);
        self.lit_at = None;
    }
}

impl<O: IndicatorOutput> IndicatorDriver for BlinkIndicator<O> {
    fn blink(&mut self, now: Timestamp) {
        self.output.set_pulse(true);
        self.lit_at = Some(now);
    }

    fn update(&mut self, now: Timestamp) {
        if let Some(lit_at) = self.lit_at {
            if now.saturating_since(lit_at) >= self.on_time {
                self.pulse_off();
            }
        }
    }

    fn set_warning(&mut self, abnormal: bool) {
        self.abnormal = abnormal;
        self.output.set_alarm(abnormal);
        if abnormal {
            self.pulse_off();
        }
    }

    fn all_off(&mut self) {
        self.pulse_off();
        self.output.set_alarm(false);
    }
}

/// Indicator driver for headless deployments
#[derive(Debug, Clone, Copy, Default)]
pub struct NullIndicator;

impl IndicatorDriver for NullIndicator {
    fn blink(&mut self, _now: Timestamp) {}
    fn update(&mut self, _now: Timestamp) {}
    fn set_warning(&mut self, _abnormal: bool) {}
    fn all_off(&mut self) {}
}
