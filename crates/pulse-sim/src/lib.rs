//! Pulse-Sim: synthetic and recorded sensor input
//!
//! Drop-in `SampleSource` and `DigitalInput` implementations for running the
//! detector without hardware.

pub mod beat_patterns;
pub mod pulse_simulator;
pub mod replay;
pub mod scripted_input;

pub use beat_patterns::BeatPattern;
pub use pulse_simulator::{NoiseConfig, PulseConfig, PulseSimulator};
pub use replay::ReplaySource;
pub use scripted_input::ScriptedButton;
