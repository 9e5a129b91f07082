//! Scripted button presses for unattended runs

use pulse_core::{Clock, DigitalInput, Timestamp};
use std::time::Duration;

/// A push button that is held down during scripted windows
///
/// Wrap it in a `DebouncedToggle` to drive the detection loop's toggle.
#[derive(Debug, Clone)]
pub struct ScriptedButton<C: Clock> {
    clock: C,
    presses: Vec<(Timestamp, Timestamp)>,
}

impl<C: Clock> ScriptedButton<C> {
    pub fn new(clock: C) -> Self {
        ScriptedButton {
            clock,
            presses: Vec::new(),
        }
    }

    /// Hold the button for `hold` starting at `at`
    pub fn press_at(mut self, at: Timestamp, hold: Duration) -> Self {
        self.presses.push((at, at.saturating_add(hold)));
        self
    }

    /// Presses at offsets from the clock's current reading
    pub fn with_presses(clock: C, offsets: &[Duration], hold: Duration) -> Self {
        let start = clock.now();
        offsets
            .iter()
            .fold(Self::new(clock), |button, &offset| button.press_at(start.saturating_add(offset), hold))
    }

    pub fn press_count(&self) -> usize {
        self.presses.len()
    }
}

impl<C: Clock> DigitalInput for ScriptedButton<C> {
    fn is_active(&mut self) -> bool {
        let now = self.clock.now();
        self.presses.iter().any(|&(start, end)| start <= now && now < end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::{DebouncedToggle, ManualClock, ToggleEdge, ToggleInput};

    #[test]
    fn test_active_only_inside_press_window() {
        let clock = ManualClock::default();
        let mut button = ScriptedButton::new(clock.clone()).press_at(Timestamp::from_millis(100), Duration::from_millis(50));

        assert!(!button.is_active());
        clock.set(Timestamp::from_millis(100));
        assert!(button.is_active());
        clock.set(Timestamp::from_millis(149));
        assert!(button.is_active());
        clock.set(Timestamp::from_millis(150));
        assert!(!button.is_active());
    }

    #[test]
    fn test_debounced_press_toggles_once() {
        let clock = ManualClock::new(Timestamp::from_secs(1));
        let button = ScriptedButton::with_presses(clock.clone(), &[Duration::from_secs(2)], Duration::from_millis(200));
        assert_eq!(button.press_count(), 1);
        let mut toggle = DebouncedToggle::new(button, Duration::from_millis(10), clock.now());

        let mut edges = Vec::new();
        for _ in 0..5_000 {
            clock.advance(Duration::from_millis(1));
            edges.extend(toggle.poll(clock.now()));
        }

        assert_eq!(edges, vec![ToggleEdge::Pressed, ToggleEdge::Released]);
    }
}
