//! Pulse-Detect: real-time beat detection and rate estimation
//!
//! Moving-average smoothing, an adaptive `mean + k * stddev` threshold, a
//! cooldown-gated peak detector and windowed BPM estimation, driven by a
//! non-blocking polling loop.

pub mod config;
pub mod detection_loop;
pub mod peak;
pub mod pipeline;
pub mod rate;
pub mod smoother;
pub mod threshold;

pub use config::{DeploymentProfile, DetectorConfig, LoopTiming, MonitorConfig, RateConfig, RateNormalization};
pub use detection_loop::{DetectionLoop, LoopStats, PollOutcome};
pub use peak::{DetectorPhase, DetectorState, PeakDetector};
pub use pipeline::{DetectionPipeline, TickOutcome};
pub use rate::RateEstimator;
pub use smoother::Smoother;
pub use threshold::{AdaptiveThresholder, WindowStats};
