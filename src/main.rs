use accel_sens::config::AppConfig;
use accel_sens::core::{RefreshManager, TelemetryAggregate, TelemetrySnapshot};
use accel_sens::HostPaths;
use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

/// accel-sens - GPU/NPU telemetry for Linux
#[derive(Parser, Debug, Clone)]
#[command(name = "accel-sens")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Refresh once, print the snapshot and exit
    #[arg(long = "once")]
    once: bool,

    /// Print snapshots as JSON instead of text
    #[arg(long = "json")]
    json: bool,

    /// Refresh interval in milliseconds (overrides the config file)
    #[arg(short = 'i', long = "interval", value_name = "MS")]
    interval: Option<u64>,

    /// Config file to load instead of the default location
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: Option<PathBuf>,

    /// Read sysfs from this directory instead of / (e.g. a captured tree)
    #[arg(short = 'r', long = "root", value_name = "DIR")]
    root: Option<PathBuf>,

    /// Debug verbosity level (0=quiet, 1=info, 2=debug, 3=trace)
    #[arg(short = 'd', long = "debug", value_name = "LEVEL", default_value = "0")]
    debug: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Level 0 (default): warn only, which still shows the === discovery banners
    let log_level = match cli.debug {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    // Allow RUST_LOG to override CLI setting
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    warn!("Starting accel-sens v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    let aggregate = Arc::new(TelemetryAggregate::new(config.telemetry.clone()));
    let manager = RefreshManager::new(Arc::clone(&aggregate), config.refresh_interval());

    if cli.once {
        let snapshot = manager.refresh_once().await?;
        print_snapshot(&snapshot, cli.json)?;
        return Ok(());
    }

    // Print from a plain thread; the notification channel is blocking
    let notifications = aggregate.subscribe();
    let printer_aggregate = Arc::clone(&aggregate);
    let json = cli.json;
    std::thread::spawn(move || {
        while notifications.recv().is_ok() {
            if let Err(e) = print_snapshot(&printer_aggregate.snapshot(), json) {
                error!("Failed to print snapshot: {:#}", e);
            }
        }
    });

    info!("Refreshing every {:?}", manager.interval());
    tokio::select! {
        _ = manager.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for Ctrl+C")?;
            warn!("Interrupted, shutting down");
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AppConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {:#}", e);
            AppConfig::default()
        }),
    };

    if let Some(root) = &cli.root {
        config.telemetry.paths = HostPaths::with_root(root);
    }
    if let Some(interval) = cli.interval {
        config.refresh_interval_ms = interval;
    }
    Ok(config)
}

fn print_snapshot(snapshot: &TelemetrySnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(snapshot)?);
    } else {
        print!("{}", snapshot.format_text());
    }
    Ok(())
}
