//! vigild — the Vigil daemon.
//!
//! Loads a fleet from a TOML config, starts the health engine and logs a
//! fleet summary once per probing period.
//!
//! # Usage
//!
//! ```text
//! vigild run --config config/vigil.toml
//! vigild once --config config/vigil.toml --report
//! vigild validate --config config/vigil.toml
//! ```

mod summary;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vigil_core::VigilConfig;
use vigil_health::{Monitor, MonitorSource, ReportSummary, SharedSource};

use crate::summary::{FleetSummary, is_stale};

const DEFAULT_LOG_FILTER: &str = "info,vigild=debug,vigil_health=debug";

/// Periods without a new snapshot before the daemon warns.
const STALE_PERIODS: u32 = 3;

#[derive(Parser)]
#[command(name = "vigild", about = "Vigil endpoint health daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the monitor and keep probing until Ctrl-C.
    Run {
        /// Path to the fleet config.
        #[arg(long, default_value = "config/vigil.toml")]
        config: PathBuf,
    },
    /// Run a single cycle and print the resulting snapshot.
    Once {
        #[arg(long, default_value = "config/vigil.toml")]
        config: PathBuf,

        /// Print the outage/flap report instead of snapshot JSON.
        #[arg(long)]
        report: bool,
    },
    /// Check a config file without probing anything.
    Validate {
        #[arg(long, default_value = "config/vigil.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json);

    match cli.command {
        Command::Run { config } => run(&config).await,
        Command::Once { config, report } => once(&config, report).await,
        Command::Validate { config } => validate(&config),
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn load_config(path: &Path) -> anyhow::Result<VigilConfig> {
    let config = VigilConfig::from_file(path)
        .with_context(|| format!("loading config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    Ok(config)
}

async fn run(path: &Path) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let monitor = Monitor::from_config(&config)?;
    let interval = monitor.interval();

    info!(
        endpoints = monitor.registry().len(),
        interval_secs = interval.as_secs(),
        "vigil daemon starting"
    );

    let source: SharedSource = Arc::new(monitor.clone());
    if !source.ensure_started() {
        anyhow::bail!("health monitor failed to start");
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; nothing has been published yet.
    ticker.tick().await;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => log_summary(&monitor),
            signal = &mut shutdown => {
                signal.context("failed to listen for Ctrl-C")?;
                info!("shutdown signal received");
                break;
            }
        }
    }

    info!(cycles = monitor.cycles_published(), "vigil daemon stopped");
    Ok(())
}

fn log_summary(monitor: &Monitor) {
    let snapshot = monitor.latest_shared();
    if snapshot.is_empty() {
        info!("waiting for the first cycle");
        return;
    }

    let summary = FleetSummary::from_snapshot(&snapshot);
    info!(
        up = summary.up,
        flapping = summary.flapping,
        down = summary.down,
        outages = summary.outages,
        last_cycle = summary.last_cycle.as_deref().unwrap_or("-"),
        "fleet status"
    );
    if !summary.down_names.is_empty() {
        warn!(endpoints = ?summary.down_names, "endpoints down");
    }

    let staleness = monitor.staleness();
    if is_stale(staleness, monitor.interval(), STALE_PERIODS) {
        warn!(?staleness, "snapshot is stale");
    }
}

async fn once(path: &Path, report: bool) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let monitor = Monitor::from_config(&config)?;
    let snapshot = monitor.try_cycle().await?;

    if report {
        print!("{}", ReportSummary::from_snapshot(&snapshot));
    } else {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    }
    Ok(())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let config = load_config(path)?;
    let settings = config.settings()?;
    println!(
        "config ok: {} endpoints, interval {}s, history {}",
        config.endpoints.len(),
        settings.interval.as_secs(),
        settings.history_len
    );
    Ok(())
}
