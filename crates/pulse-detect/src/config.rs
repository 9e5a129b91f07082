//! Configuration management for the detector and its polling loop

use pulse_core::{config_error, AdcScale, BpmRange, PulseError, PulseResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Largest accepted smoothing or threshold window, in samples
pub const MAX_WINDOW: usize = 1024;

/// Complete monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Configuration name
    pub name: String,
    /// Deployment this configuration targets
    pub profile: DeploymentProfile,
    /// Resolution of the sensor ADC; readings are scaled to 16 bits
    pub adc_bits: u8,
    /// Signal chain parameters
    pub detector: DetectorConfig,
    /// Software timer intervals
    pub timing: LoopTiming,
    /// Normal BPM range; `None` disables the alarm indicator
    pub alarm: Option<BpmRange>,
    /// Log every smoothed value at debug level
    pub show_values: bool,
}

/// Known deployments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeploymentProfile {
    /// Toggle button, beat LED and alarm light
    Indicator,
    /// Log output only, runs unconditionally
    Headless,
    /// Hand-edited configuration
    Custom,
}

/// Parameters of the smoothing, threshold, peak and rate stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Moving-average ring size (raw samples)
    pub smoothing_window: usize,
    /// Rolling threshold window (smoothed samples)
    pub threshold_window: usize,
    /// Standard deviations above the mean for the threshold
    pub sensitivity: f64,
    /// Drop below `threshold - margin` required to re-arm
    pub hysteresis_margin: u16,
    /// Shortest physiologically plausible beat spacing
    pub min_beat_interval_ms: u64,
    /// Hard refractory period after each beat
    pub cooldown_ms: u64,
    pub rate: RateConfig,
}

/// Rate window parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateConfig {
    pub window_ms: u64,
    pub normalization: RateNormalization,
}

/// How a window's beat count becomes beats per minute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RateNormalization {
    /// `beats * 60000 / elapsed_ms`, truncated
    Proportional,
    /// `beats * factor`; the window must be `60000 / factor` ms long
    FixedMultiplier(u32),
}

/// Software timer intervals of the polling loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopTiming {
    /// Interval between measurements (40ms = 25Hz)
    pub measure_interval_ms: u64,
    /// Granularity at which the runner polls the loop
    pub poll_interval_ms: u64,
    /// On-time of the beat indicator
    pub blink_ms: u64,
    /// Minimum spacing between reported toggle edges
    pub debounce_ms: u64,
}

/// Preset configurations for the two deployments
impl MonitorConfig {
    /// Button, beat LED and alarm light; 30s window counted twice
    pub fn indicator() -> Self {
        MonitorConfig {
            name: "Indicator".to_string(),
            profile: DeploymentProfile::Indicator,
            adc_bits: 16,
            detector: DetectorConfig {
                rate: RateConfig {
                    window_ms: 30_000,
                    normalization: RateNormalization::FixedMultiplier(2),
                },
                ..DetectorConfig::default()
            },
            timing: LoopTiming::default(),
            alarm: Some(BpmRange::RESTING),
            show_values: false,
        }
    }

    /// Log-only deployment on a 12-bit ADC; 10s proportional window
    pub fn headless() -> Self {
        MonitorConfig {
            name: "Headless".to_string(),
            profile: DeploymentProfile::Headless,
            adc_bits: 12,
            detector: DetectorConfig::default(),
            timing: LoopTiming::default(),
            alarm: None,
            show_values: false,
        }
    }

    /// Create configuration suitable for given profile
    pub fn for_profile(profile: DeploymentProfile) -> Self {
        match profile {
            DeploymentProfile::Indicator => Self::indicator(),
            DeploymentProfile::Headless => Self::headless(),
            DeploymentProfile::Custom => MonitorConfig {
                name: "Custom".to_string(),
                profile: DeploymentProfile::Custom,
                ..Self::headless()
            },
        }
    }

    pub fn adc_scale(&self) -> PulseResult<AdcScale> {
        AdcScale::new(self.adc_bits)
    }

    /// Validate entire configuration
    pub fn validate(&self) -> PulseResult<()> {
        self.adc_scale()?;
        self.detector.validate()?;
        self.timing.validate()?;

        if let Some(alarm) = &self.alarm {
            alarm.validate()?;
        }

        Ok(())
    }

    /// Export configuration to JSON
    pub fn to_json(&self) -> PulseResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| PulseError::Serialization {
            reason: format!("Failed to serialize configuration: {}", e),
        })
    }

    /// Import configuration from JSON
    pub fn from_json(json: &str) -> PulseResult<Self> {
        serde_json::from_str(json).map_err(|e| PulseError::Serialization {
            reason: format!("Failed to deserialize configuration: {}", e),
        })
    }

    /// Read, parse and validate a JSON configuration file
    pub fn load(path: impl AsRef<Path>) -> PulseResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| PulseError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config = Self::from_json(&json)?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::indicator()
    }
}

impl DetectorConfig {
    pub fn min_beat_interval(&self) -> Duration {
        Duration::from_millis(self.min_beat_interval_ms)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn validate(&self) -> PulseResult<()> {
        if !(1..=MAX_WINDOW).contains(&self.smoothing_window) {
            return Err(config_error!(
                "detector.smoothing_window",
                "must be between 1 and {}, got {}",
                MAX_WINDOW,
                self.smoothing_window
            ));
        }

        if !(1..=MAX_WINDOW).contains(&self.threshold_window) {
            return Err(config_error!(
                "detector.threshold_window",
                "must be between 1 and {}, got {}",
                MAX_WINDOW,
                self.threshold_window
            ));
        }

        if !self.sensitivity.is_finite() || self.sensitivity < 0.0 {
            return Err(config_error!(
                "detector.sensitivity",
                "must be finite and non-negative, got {}",
                self.sensitivity
            ));
        }

        if self.cooldown_ms > self.min_beat_interval_ms {
            return Err(config_error!(
                "detector.cooldown_ms",
                "cooldown {}ms exceeds minimum beat interval {}ms",
                self.cooldown_ms,
                self.min_beat_interval_ms
            ));
        }

        self.rate.validate()
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            smoothing_window: 4,
            threshold_window: 25,
            sensitivity: 0.9,
            hysteresis_margin: 100,
            min_beat_interval_ms: 400,
            cooldown_ms: 200,
            rate: RateConfig::default(),
        }
    }
}

impl RateConfig {
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    pub fn validate(&self) -> PulseResult<()> {
        if self.window_ms == 0 {
            return Err(config_error!("detector.rate.window_ms", "must be greater than 0"));
        }

        if let RateNormalization::FixedMultiplier(factor) = self.normalization {
            if factor == 0 || self.window_ms.saturating_mul(u64::from(factor)) != 60_000 {
                return Err(config_error!(
                    "detector.rate.normalization",
                    "multiplier {} does not scale a {}ms window to one minute",
                    factor,
                    self.window_ms
                ));
            }
        }

        Ok(())
    }
}

impl Default for RateConfig {
    fn default() -> Self {
        RateConfig {
            window_ms: 10_000,
            normalization: RateNormalization::Proportional,
        }
    }
}

impl LoopTiming {
    pub fn measure_interval(&self) -> Duration {
        Duration::from_millis(self.measure_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn blink(&self) -> Duration {
        Duration::from_millis(self.blink_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn validate(&self) -> PulseResult<()> {
        if self.measure_interval_ms == 0 {
            return Err(config_error!("timing.measure_interval_ms", "must be greater than 0"));
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > self.measure_interval_ms {
            return Err(config_error!(
                "timing.poll_interval_ms",
                "must be between 1 and the measurement interval ({}ms), got {}",
                self.measure_interval_ms,
                self.poll_interval_ms
            ));
        }

        Ok(())
    }
}

impl Default for LoopTiming {
    fn default() -> Self {
        LoopTiming {
            measure_interval_ms: 40,
            poll_interval_ms: 1,
            blink_ms: 100,
            debounce_ms: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_config() {
        let config = MonitorConfig::indicator();
        assert_eq!(config.profile, DeploymentProfile::Indicator);
        assert_eq!(config.alarm, Some(BpmRange::RESTING));
        assert_eq!(config.detector.rate.window_ms, 30_000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_headless_config() {
        let config = MonitorConfig::headless();
        assert_eq!(config.profile, DeploymentProfile::Headless);
        assert_eq!(config.adc_bits, 12);
        assert!(config.alarm.is_none());
        assert_eq!(config.detector.rate.normalization, RateNormalization::Proportional);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_reference_detector_parameters() {
        let detector = DetectorConfig::default();
        assert_eq!(detector.smoothing_window, 4);
        assert_eq!(detector.threshold_window, 25);
        assert_eq!(detector.sensitivity, 0.9);
        assert_eq!(detector.hysteresis_margin, 100);
        assert_eq!(detector.min_beat_interval(), Duration::from_millis(400));
        assert_eq!(detector.cooldown(), Duration::from_millis(200));
        assert_eq!(LoopTiming::default().measure_interval(), Duration::from_millis(40));
    }

    #[test]
    fn test_config_validation() {
        let mut config = MonitorConfig::headless();

        config.detector.smoothing_window = 0;
        assert!(config.validate().is_err());

        config.detector.smoothing_window = MAX_WINDOW + 1;
        assert!(config.validate().is_err());

        config.detector.smoothing_window = MAX_WINDOW;
        assert!(config.validate().is_ok());

        config.detector.smoothing_window = 4;
        config.detector.threshold_window = 0;
        assert!(config.validate().is_err());

        config.detector.threshold_window = usize::MAX;
        assert!(matches!(
            config.validate(),
            Err(PulseError::InvalidConfig {
                field: "detector.threshold_window",
                ..
            })
        ));

        config.detector.threshold_window = MAX_WINDOW;
        assert!(config.validate().is_ok());

        config.detector.threshold_window = 25;
        config.detector.sensitivity = f64::NAN;
        assert!(config.validate().is_err());

        config.detector.sensitivity = 0.9;
        config.detector.cooldown_ms = 500;
        assert!(config.validate().is_err());

        config.detector.cooldown_ms = 200;
        config.timing.poll_interval_ms = 0;
        assert!(config.validate().is_err());

        config.timing.poll_interval_ms = 1;
        config.adc_bits = 20;
        assert!(config.validate().is_err());

        config.adc_bits = 12;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_fixed_multiplier_must_match_window() {
        let mut rate = RateConfig {
            window_ms: 30_000,
            normalization: RateNormalization::FixedMultiplier(2),
        };
        assert!(rate.validate().is_ok());

        rate.window_ms = 10_000;
        assert!(rate.validate().is_err());

        rate.normalization = RateNormalization::FixedMultiplier(6);
        assert!(rate.validate().is_ok());
    }

    #[test]
    fn test_inverted_alarm_rejected() {
        let mut config = MonitorConfig::indicator();
        config.alarm = Some(BpmRange { low: 100, high: 60 });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_serialization() {
        let config = MonitorConfig::indicator();

        let json = config.to_json().unwrap();
        assert!(json.contains("FixedMultiplier"));

        let deserialized = MonitorConfig::from_json(&json).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_malformed_json() {
        let result = MonitorConfig::from_json("{ \"name\": 3 }");
        assert!(matches!(result, Err(PulseError::Serialization { .. })));
    }

    fn scratch_file(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("pulse-detect-{}-{}.json", std::process::id(), name));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_round_trip() {
        let config = MonitorConfig::indicator();
        let path = scratch_file("round-trip", &config.to_json().unwrap());

        let loaded = MonitorConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.unwrap(), config);
    }

    #[test]
    fn test_load_rejects_invalid_config() {
        let mut config = MonitorConfig::headless();
        config.detector.threshold_window = 0;
        let path = scratch_file("invalid", &serde_json::to_string(&config).unwrap());

        let loaded = MonitorConfig::load(&path);
        std::fs::remove_file(&path).unwrap();

        assert!(matches!(
            loaded,
            Err(PulseError::InvalidConfig {
                field: "detector.threshold_window",
                ..
            })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = MonitorConfig::load("/nonexistent/pulse-monitor.json");
        assert!(matches!(result, Err(PulseError::Io { .. })));
    }

    #[test]
    fn test_profile_creation() {
        assert_eq!(
            MonitorConfig::for_profile(DeploymentProfile::Indicator).profile,
            DeploymentProfile::Indicator
        );
        assert_eq!(
            MonitorConfig::for_profile(DeploymentProfile::Headless).profile,
            DeploymentProfile::Headless
        );
        let custom = MonitorConfig::for_profile(DeploymentProfile::Custom);
        assert_eq!(custom.profile, DeploymentProfile::Custom);
        assert!(custom.validate().is_ok());
    }
}
