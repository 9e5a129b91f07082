//! Command-line interface

use clap::{Parser, ValueEnum};
use pulse_detect::DeploymentProfile;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "pulse-monitor")]
#[command(version)]
#[command(about = "Real-time pulse detection with BPM estimation", long_about = None)]
pub struct Cli {
    /// Deployment preset used when no configuration file is given
    #[arg(long, value_enum, default_value_t = ProfileArg::Indicator)]
    pub profile: ProfileArg,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Print the effective configuration as JSON and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Replay recorded readings (one integer per line) instead of simulating
    #[arg(long, conflicts_with_all = ["bpm", "pattern"])]
    pub replay: Option<PathBuf>,

    /// Restart the recording when it runs out
    #[arg(long, requires = "replay")]
    pub loop_replay: bool,

    /// Simulated heart rate
    #[arg(long, default_value_t = 70.0)]
    pub bpm: f64,

    /// Named beat pattern preset (resting, exercise, arrhythmia, ...)
    #[arg(long)]
    pub pattern: Option<String>,

    /// Gaussian noise, as a fraction of full scale
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Random seed for the simulator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Probability that a sensor read fails
    #[arg(long, default_value_t = 0.0)]
    pub dropout: f64,

    /// Press the toggle button at these offsets (seconds)
    #[arg(long = "toggle-at", num_args = 1..)]
    pub toggle_at: Vec<f64>,

    /// Stop after this many seconds
    #[arg(long)]
    pub duration: Option<f64>,

    /// Run on a virtual clock as fast as possible
    #[arg(long, requires = "duration")]
    pub accelerated: bool,

    /// Log every smoothed value at debug level
    #[arg(long)]
    pub show_values: bool,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short, long, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProfileArg {
    /// LED beat indicator with abnormal-rate alarm
    Indicator,
    /// Log-only deployment
    Headless,
}

impl From<ProfileArg> for DeploymentProfile {
    fn from(profile: ProfileArg) -> Self {
        match profile {
            ProfileArg::Indicator => DeploymentProfile::Indicator,
            ProfileArg::Headless => DeploymentProfile::Headless,
        }
    }
}

impl Cli {
    pub fn run_duration(&self) -> Option<Duration> {
        self.duration.map(seconds)
    }

    pub fn toggle_offsets(&self) -> Vec<Duration> {
        self.toggle_at.iter().copied().map(seconds).collect()
    }
}

/// Negative or non-finite offsets count as zero
fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
}
