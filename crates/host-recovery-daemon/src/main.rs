//! host-reset-recovery - Post-restart host recovery check
//!
//! Started once after every BMC restart while chassis power is on. Waits for
//! the chassis power-on target to complete, reads the host's last boot
//! progress, and creates a `HostNotRunning` error log if the host was in the
//! middle of booting when the BMC went down.
//!
//! Exit status is zero whether or not an incident was recorded; any failure
//! to read boot progress or to create the log exits nonzero.
//!
//! The runtime is single-threaded: the check is a strictly sequential
//! pipeline and the only suspension point is the readiness poll.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use host_recovery_core::{FsMarker, RecoveryCheck, RecoveryConfig, RecoveryOutcome};
use host_recovery_daemon::bus::{HostStateClient, LoggingClient};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Default location of the optional configuration file.
const DEFAULT_CONFIG_PATH: &str = "/etc/host-reset-recovery/config.toml";

/// Check whether the host was booting across a BMC restart
#[derive(Parser, Debug)]
#[command(name = "host-reset-recovery")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (defaults are used if it does not exist)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log to file instead of stdout
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Loads the configuration file, falling back to defaults when absent.
fn load_config(args: &Args) -> Result<RecoveryConfig> {
    if args.config.exists() {
        RecoveryConfig::from_file(&args.config).with_context(|| {
            format!("failed to load configuration from {}", args.config.display())
        })
    } else {
        Ok(RecoveryConfig::default())
    }
}

fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(log_file) = &args.log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)
            .context("failed to open log file")?;

        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(file)
                    .with_ansi(false),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        let config = load_config(&args)?;
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create Tokio runtime")?;

    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    init_logging(&args)?;

    if !args.config.exists() {
        warn!(
            path = %args.config.display(),
            "configuration file not found, using defaults"
        );
    }
    let config = load_config(&args)?;

    let connection = zbus::Connection::system()
        .await
        .context("failed to connect to system bus")?;

    let marker = FsMarker::from_config(&config.readiness);
    info!(
        marker = %marker.path().display(),
        poll_interval = ?config.readiness.poll_interval,
        "starting host reset recovery check"
    );

    let check = RecoveryCheck::from_config(
        &config,
        marker,
        HostStateClient::new(connection.clone()),
        LoggingClient::new(connection),
    );

    match check.run().await.context("host reset recovery check failed")? {
        RecoveryOutcome::HostIdle => info!("no recovery action needed"),
        RecoveryOutcome::IncidentReported => info!("host not running error log created"),
    }
    Ok(())
}
