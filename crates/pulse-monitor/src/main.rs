//! Pulse Monitor - beat detection and BPM estimation on simulated or recorded input

mod args;
mod console_indicator;
mod runner;

use anyhow::Context;
use args::Cli;
use clap::Parser;
use pulse_detect::MonitorConfig;
use tracing::{info, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use uuid::Uuid;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cli.log_level))
        .with_context(|| format!("Invalid log level {:?}", cli.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = load_config(&cli)?;

    if cli.dump_config {
        println!("{}", config.to_json()?);
        return Ok(());
    }

    let session = Uuid::new_v4();
    let span = info_span!("session", id = %session, profile = ?config.profile);
    let _guard = span.enter();

    info!(name = %config.name, adc_bits = config.adc_bits, "Starting pulse monitor");

    let stats = runner::run(&cli, &config)?;

    info!(
        beats = stats.beats,
        rates = stats.rates_emitted,
        sensor_errors = stats.sensor_errors,
        "Session finished"
    );
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<MonitorConfig> {
    let mut config = match &cli.config {
        Some(path) => MonitorConfig::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => MonitorConfig::for_profile(cli.profile.into()),
    };

    if cli.show_values {
        config.show_values = true;
    }

    config.validate().context("Invalid monitor configuration")?;
    Ok(config)
}
