//! Tactile Scenario - play a gesture scenario and report the outcome
//!
//! ```text
//! tactile-scenario scripts/double_tap.json --report reports/double_tap.json
//! ```
//!
//! Exits with status 1 when an expectation fails.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tactile_core::GestureConfig;
use tactile_scenario::{GestureScenario, ScenarioRunner};
use tracing_subscriber::EnvFilter;

/// Play a gesture scenario against a touch surface
#[derive(Parser, Debug)]
#[command(name = "tactile-scenario")]
#[command(version)]
struct Args {
    /// Scenario file (JSON)
    scenario: PathBuf,

    /// Gesture thresholds (TOML), replacing the scenario's own
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the report here (relative path) instead of stdout
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Log every step and arbitration decision
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut scenario = GestureScenario::from_path(&args.scenario)?;
    if let Some(path) = &args.config {
        let raw = std::fs::read_to_string(path)?;
        scenario.config = Some(GestureConfig::from_toml_str(&raw)?);
    }

    tracing::info!(
        "Playing {} ({} recognizers, {} steps)",
        args.scenario.display(),
        scenario.recognizers.len(),
        scenario.steps.len()
    );
    let outcome = ScenarioRunner::new(&scenario)?.run(&scenario.steps)?;

    match &args.report {
        Some(path) => {
            outcome.report().write_to_path(path)?;
            tracing::info!("Report written to {}", path.display());
        }
        None => outcome.report().write_to_writer(&mut std::io::stdout().lock())?,
    }

    if outcome.is_failed() {
        std::process::exit(1);
    }
    Ok(())
}
