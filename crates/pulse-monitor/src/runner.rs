//! Wiring of sources, inputs and indicators, and the two run modes

use anyhow::{anyhow, Context};
use pulse_core::{
    BlinkIndicator, Clock, DebouncedToggle, IndicatorDriver, ManualClock, MonotonicClock, NoToggle, NullIndicator,
    SampleSource, ToggleInput,
};
use pulse_detect::{DeploymentProfile, DetectionLoop, LoopStats, MonitorConfig};
use pulse_sim::{BeatPattern, NoiseConfig, PulseConfig, PulseSimulator, ReplaySource, ScriptedButton};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::args::Cli;
use crate::console_indicator::ConsoleIndicator;

/// How long a scripted press holds the button down
const PRESS_HOLD: Duration = Duration::from_millis(200);

pub type MonitorLoop = DetectionLoop<Box<dyn SampleSource>, Box<dyn ToggleInput>, Box<dyn IndicatorDriver>>;

/// Run the monitor in the mode selected on the command line
pub fn run(cli: &Cli, config: &MonitorConfig) -> anyhow::Result<LoopStats> {
    if cli.accelerated {
        let duration = cli
            .run_duration()
            .ok_or_else(|| anyhow!("--accelerated needs --duration"))?;
        let clock = ManualClock::default();
        let mut detection = build_loop(cli, config, clock.clone())?;
        run_accelerated(&mut detection, &clock, config.timing.poll_interval(), duration);
        return Ok(detection.stats().clone());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    let clock = MonotonicClock::new();
    let mut detection = build_loop(cli, config, clock)?;
    runtime.block_on(run_realtime(
        &mut detection,
        &clock,
        config.timing.poll_interval(),
        cli.run_duration(),
    ))?;
    Ok(detection.stats().clone())
}

pub fn build_loop<C: Clock + Clone + 'static>(cli: &Cli, config: &MonitorConfig, clock: C) -> anyhow::Result<MonitorLoop> {
    let now = clock.now();
    let source = build_source(cli, config, clock.clone())?;
    let toggle = build_toggle(cli, config, clock);
    let indicator = build_indicator(config);

    DetectionLoop::new(config, source, toggle, indicator, now).context("Invalid monitor configuration")
}

fn build_source<C: Clock + 'static>(cli: &Cli, config: &MonitorConfig, clock: C) -> anyhow::Result<Box<dyn SampleSource>> {
    if let Some(path) = &cli.replay {
        let replay = ReplaySource::from_file(path)
            .with_context(|| format!("Failed to load recording {}", path.display()))?
            .looping(cli.loop_replay);
        info!(path = %path.display(), readings = replay.len(), "Replaying recording");
        return Ok(Box::new(replay));
    }

    let pattern = match &cli.pattern {
        Some(name) => BeatPattern::preset(name).ok_or_else(|| {
            let known: Vec<&str> = BeatPattern::presets().into_iter().map(|(name, _)| name).collect();
            anyhow!("Unknown pattern {:?}; expected one of {}", name, known.join(", "))
        })?,
        None => BeatPattern::Steady { bpm: cli.bpm },
    };

    let simulation = PulseConfig {
        pattern,
        adc_bits: config.adc_bits,
        noise: NoiseConfig {
            gaussian_std: cli.noise,
            ..NoiseConfig::default()
        },
        dropout_prob: cli.dropout,
        seed: cli.seed,
        ..PulseConfig::default()
    };
    info!(kind = pattern.description(), ?pattern, "Simulating pulse sensor");

    let simulator = PulseSimulator::new(simulation, clock).context("Invalid simulator settings")?;
    Ok(Box::new(simulator))
}

fn build_toggle<C: Clock + 'static>(cli: &Cli, config: &MonitorConfig, clock: C) -> Box<dyn ToggleInput> {
    let offsets = cli.toggle_offsets();
    if offsets.is_empty() {
        return Box::new(NoToggle);
    }

    let now = clock.now();
    let button = ScriptedButton::with_presses(clock, &offsets, PRESS_HOLD);
    info!(presses = button.press_count(), "Scripted toggle presses");
    Box::new(DebouncedToggle::new(button, config.timing.debounce(), now))
}

fn build_indicator(config: &MonitorConfig) -> Box<dyn IndicatorDriver> {
    match config.profile {
        DeploymentProfile::Headless => Box::new(NullIndicator),
        _ => Box::new(BlinkIndicator::new(ConsoleIndicator::default(), config.timing.blink())),
    }
}

/// Drive the loop on a virtual clock, one poll interval at a time
pub fn run_accelerated<S, T, I>(detection: &mut DetectionLoop<S, T, I>, clock: &ManualClock, poll: Duration, duration: Duration)
where
    S: SampleSource,
    T: ToggleInput,
    I: IndicatorDriver,
{
    let end = clock.now().saturating_add(duration);
    info!(duration = ?duration, "Running on virtual clock");

    while clock.now() < end {
        clock.advance(poll);
        detection.poll(clock.now());
    }
}

/// Poll in real time until the run duration elapses or Ctrl-C arrives
pub async fn run_realtime<S, T, I, C>(
    detection: &mut DetectionLoop<S, T, I>,
    clock: &C,
    poll: Duration,
    duration: Option<Duration>,
) -> anyhow::Result<()>
where
    S: SampleSource,
    T: ToggleInput,
    I: IndicatorDriver,
    C: Clock,
{
    let deadline = duration.map(|d| clock.now().saturating_add(d));
    let mut poll_timer = interval(poll);
    poll_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(poll = ?poll, "Monitoring, press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = poll_timer.tick() => {
                let now = clock.now();
                if deadline.map_or(false, |deadline| now >= deadline) {
                    info!("Run duration reached");
                    break;
                }
                detection.poll(now);
            }
            result = &mut ctrl_c => {
                result.context("Failed to listen for Ctrl-C")?;
                info!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}
