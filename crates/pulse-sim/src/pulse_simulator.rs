//! Pulse sensor simulator with realistic beat shapes and artefacts

use crate::beat_patterns::BeatPattern;
use pulse_core::{AdcScale, Clock, PulseError, PulseResult, SampleSource, Timestamp};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Configuration for pulse simulation
///
/// Levels are fractions of the ADC full scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PulseConfig {
    /// Beat rate over time
    pub pattern: BeatPattern,
    /// Resolution of the simulated ADC
    pub adc_bits: u8,
    /// Resting level between beats
    pub baseline: f64,
    /// Height of a beat above the baseline
    pub amplitude: f64,
    /// Standard deviation of the Gaussian beat shape
    pub hump_width_ms: f64,
    pub noise: NoiseConfig,
    /// Probability that a single read fails
    pub dropout_prob: f64,
    /// Random seed for reproducibility
    pub seed: Option<u64>,
}

/// Noise configuration for realistic pulse simulation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Gaussian noise standard deviation (0.0 = no noise)
    pub gaussian_std: f64,
    /// Baseline wander amplitude (0.1Hz drift)
    pub baseline_wander: f64,
    /// Motion artifact probability per read (0.0 to 1.0)
    pub motion_artifact_prob: f64,
    /// Motion artifact amplitude
    pub motion_artifact_amp: f64,
}

impl NoiseConfig {
    /// A perfectly clean sensor
    pub fn none() -> Self {
        Self {
            gaussian_std: 0.0,
            baseline_wander: 0.0,
            motion_artifact_prob: 0.0,
            motion_artifact_amp: 0.0,
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            gaussian_std: 0.01,
            baseline_wander: 0.02,
            motion_artifact_prob: 0.002,
            motion_artifact_amp: 0.2,
        }
    }
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            pattern: BeatPattern::default(),
            adc_bits: 12,
            baseline: 0.25,
            amplitude: 0.5,
            hump_width_ms: 50.0,
            noise: NoiseConfig::default(),
            dropout_prob: 0.0,
            seed: None,
        }
    }
}

impl PulseConfig {
    pub fn validate(&self) -> PulseResult<()> {
        self.pattern.validate()?;
        AdcScale::new(self.adc_bits)?;

        let fraction = |v: f64| (0.0..=1.0).contains(&v);
        if !fraction(self.baseline) || !fraction(self.amplitude) {
            return Err(PulseError::InvalidConfig {
                field: "baseline",
                reason: "baseline and amplitude must be fractions of full scale".to_string(),
            });
        }
        if !(self.hump_width_ms.is_finite() && self.hump_width_ms > 0.0) {
            return Err(PulseError::InvalidConfig {
                field: "hump_width_ms",
                reason: format!("must be positive, got {}", self.hump_width_ms),
            });
        }
        if !fraction(self.dropout_prob) || !fraction(self.noise.motion_artifact_prob) {
            return Err(PulseError::InvalidConfig {
                field: "dropout_prob",
                reason: "probabilities must lie in [0, 1]".to_string(),
            });
        }
        Ok(())
    }
}

/// Simulated pulse sensor
///
/// Readings are generated for the clock's current time, so the simulator
/// follows whatever clock drives the detection loop.
pub struct PulseSimulator<C: Clock> {
    config: PulseConfig,
    clock: C,
    scale: AdcScale,
    rng: StdRng,
    normal_dist: Normal<f64>,
    origin: Timestamp,
    previous_beat: Option<f64>,
    next_beat: Option<f64>,
    beats_generated: u64,
}

impl<C: Clock> PulseSimulator<C> {
    /// Create new pulse simulator; simulated time starts at `clock.now()`
    pub fn new(config: PulseConfig, clock: C) -> PulseResult<Self> {
        config.validate()?;

        let scale = AdcScale::new(config.adc_bits)?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let normal_dist = Normal::new(0.0, config.noise.gaussian_std).map_err(|e| PulseError::InvalidConfig {
            field: "noise.gaussian_std",
            reason: format!("Failed to create normal distribution: {}", e),
        })?;

        let origin = clock.now();
        let mut simulator = PulseSimulator {
            config,
            clock,
            scale,
            rng,
            normal_dist,
            origin,
            previous_beat: None,
            next_beat: None,
            beats_generated: 0,
        };
        simulator.reset();
        Ok(simulator)
    }

    /// Restart simulated time at the clock's current reading
    pub fn reset(&mut self) {
        self.origin = self.clock.now();
        self.previous_beat = None;
        self.beats_generated = 0;
        // First beat half an interval in
        self.next_beat = self.config.pattern.rate_at(0.0).map(|bpm| 30.0 / bpm);
    }

    /// Beat centres passed so far; the ground truth for detector checks
    pub fn beats_generated(&self) -> u64 {
        self.beats_generated
    }

    /// Signal level at `time` seconds as a fraction of full scale
    fn level_at(&mut self, time: f64) -> f64 {
        while let Some(next) = self.next_beat.filter(|&next| next <= time) {
            self.previous_beat = Some(next);
            self.beats_generated += 1;
            self.next_beat = self.schedule_after(next);
        }

        let sigma = self.config.hump_width_ms / 1_000.0;
        let hump = |centre: f64| (-((time - centre) / sigma).powi(2)).exp();
        let pulse: f64 = self.previous_beat.into_iter().chain(self.next_beat).map(hump).sum();

        self.config.baseline + self.config.amplitude * pulse + self.add_noise(time)
    }

    fn schedule_after(&mut self, beat: f64) -> Option<f64> {
        let bpm = self.config.pattern.rate_at(beat)?;
        let jitter = self.config.pattern.jitter();
        let mut interval = 60.0 / bpm;
        if jitter > 0.0 {
            interval *= 1.0 + self.rng.gen_range(-jitter..=jitter);
        }
        Some(beat + interval)
    }

    /// Add various noise components
    fn add_noise(&mut self, time: f64) -> f64 {
        let noise = &self.config.noise;
        let mut value = self.normal_dist.sample(&mut self.rng);

        // Baseline wander (slow drift)
        value += noise.baseline_wander * (2.0 * PI * 0.1 * time).sin();

        // Motion artifacts (random spikes)
        if self.rng.gen::<f64>() < noise.motion_artifact_prob {
            value += noise.motion_artifact_amp * self.rng.gen_range(-1.0..1.0);
        }

        value
    }
}

impl<C: Clock> SampleSource for PulseSimulator<C> {
    fn read(&mut self) -> PulseResult<u32> {
        let time = self.clock.now().saturating_since(self.origin).as_secs_f64();

        if self.config.dropout_prob > 0.0 && self.rng.gen::<f64>() < self.config.dropout_prob {
            return Err(PulseError::SensorUnavailable {
                reason: format!("simulated dropout at {:.3}s", time),
            });
        }

        let level = self.level_at(time).clamp(0.0, 1.0);
        Ok((level * f64::from(self.scale.full_scale())).round() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_core::ManualClock;
    use std::time::Duration;

    const TICK: Duration = Duration::from_millis(40);

    fn clean(pattern: BeatPattern) -> PulseConfig {
        PulseConfig {
            pattern,
            noise: NoiseConfig::none(),
            seed: Some(7),
            ..PulseConfig::default()
        }
    }

    fn collect(simulator: &mut PulseSimulator<ManualClock>, clock: &ManualClock, ticks: usize) -> Vec<PulseResult<u32>> {
        (0..ticks)
            .map(|_| {
                clock.advance(TICK);
                simulator.read()
            })
            .collect()
    }

    #[test]
    fn test_steady_pulse_shape() {
        let clock = ManualClock::default();
        let mut simulator = PulseSimulator::new(clean(BeatPattern::Steady { bpm: 60.0 }), clock.clone()).unwrap();

        let readings: Vec<u32> = collect(&mut simulator, &clock, 250).into_iter().map(Result::unwrap).collect();

        let max = *readings.iter().max().unwrap();
        let min = *readings.iter().min().unwrap();
        assert_eq!(min, 1_024);
        assert!(max > 2_600 && max <= 4_095, "max {}", max);
        assert_eq!(simulator.beats_generated(), 10);
    }

    #[test]
    fn test_flatline_sits_on_baseline() {
        let clock = ManualClock::default();
        let mut simulator = PulseSimulator::new(clean(BeatPattern::Flatline), clock.clone()).unwrap();

        for reading in collect(&mut simulator, &clock, 100) {
            assert_eq!(reading.unwrap(), 1_024);
        }
        assert_eq!(simulator.beats_generated(), 0);
    }

    #[test]
    fn test_output_clamped_to_full_scale() {
        let clock = ManualClock::default();
        let config = PulseConfig {
            baseline: 0.9,
            amplitude: 0.5,
            ..clean(BeatPattern::Steady { bpm: 90.0 })
        };
        let mut simulator = PulseSimulator::new(config, clock.clone()).unwrap();

        let readings: Vec<u32> = collect(&mut simulator, &clock, 100).into_iter().map(Result::unwrap).collect();
        assert!(readings.iter().all(|&r| r <= 4_095));
        assert!(readings.contains(&4_095));
    }

    #[test]
    fn test_seed_reproducibility() {
        let config = PulseConfig {
            pattern: BeatPattern::Irregular { bpm: 80.0, jitter: 0.2 },
            seed: Some(42),
            ..PulseConfig::default()
        };

        let run = || {
            let clock = ManualClock::default();
            let mut simulator = PulseSimulator::new(config.clone(), clock.clone()).unwrap();
            collect(&mut simulator, &clock, 200)
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_total_dropout() {
        let clock = ManualClock::default();
        let config = PulseConfig {
            dropout_prob: 1.0,
            ..clean(BeatPattern::default())
        };
        let mut simulator = PulseSimulator::new(config, clock.clone()).unwrap();

        for reading in collect(&mut simulator, &clock, 20) {
            assert!(matches!(reading, Err(PulseError::SensorUnavailable { .. })));
        }
    }

    #[test]
    fn test_irregular_rate_stays_near_nominal() {
        let clock = ManualClock::default();
        let config = clean(BeatPattern::Irregular { bpm: 60.0, jitter: 0.3 });
        let mut simulator = PulseSimulator::new(config, clock.clone()).unwrap();

        collect(&mut simulator, &clock, 1_500);
        let beats = simulator.beats_generated();
        assert!((46..=86).contains(&beats), "beats {}", beats);
    }

    #[test]
    fn test_reset_restarts_time() {
        let clock = ManualClock::default();
        let mut simulator = PulseSimulator::new(clean(BeatPattern::Steady { bpm: 60.0 }), clock.clone()).unwrap();
        collect(&mut simulator, &clock, 100);
        assert!(simulator.beats_generated() > 0);

        simulator.reset();
        assert_eq!(simulator.beats_generated(), 0);
        assert_eq!(simulator.read().unwrap(), 1_024);
    }

    #[test]
    fn test_invalid_config() {
        let clock = ManualClock::default();
        let bad_dropout = PulseConfig {
            dropout_prob: 1.5,
            ..PulseConfig::default()
        };
        assert!(PulseSimulator::new(bad_dropout, clock.clone()).is_err());

        let bad_adc = PulseConfig {
            adc_bits: 0,
            ..PulseConfig::default()
        };
        assert!(PulseSimulator::new(bad_adc, clock).is_err());
    }
}
