// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Keep daemon (keepd)
//!
//! Starts a fortress, keeps it running until SIGTERM or SIGINT, then
//! locks it down and waits for every visit to finish before exiting.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use keep_daemon::lifecycle::{self, LifecycleError};
use keep_daemon::{Config, LogConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Fortress supervisor daemon
#[derive(Debug, Parser)]
#[command(name = "keepd", version, about)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("keepd: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), LifecycleError> {
    // Load configuration
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    // Set up logging; the guard flushes the file writer on drop
    let _log_guard = setup_logging(&config.log)?;

    info!(config = ?args.config, "Starting keepd");

    let supervisor = match lifecycle::startup(&config.fortress).await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to start fortress: {}", e);
            return Err(e);
        }
    };

    // Set up signal handlers
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    // Signal ready for parent process (e.g., systemd, tests waiting for startup)
    println!("READY");

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }

    supervisor.shutdown().await?;

    info!("Daemon stopped");
    Ok(())
}

fn setup_logging(
    config: &LogConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.filter)
            .map_err(|e| LifecycleError::Logging(format!("bad filter {:?}: {}", config.filter, e)))?,
    };

    let Some(path) = &config.path else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| LifecycleError::Logging(e.to_string()))?;
        return Ok(None);
    };

    // Create log directory if needed
    let dir = path
        .parent()
        .ok_or_else(|| LifecycleError::Logging(format!("no directory in {}", path.display())))?;
    let file_name = path
        .file_name()
        .ok_or_else(|| LifecycleError::Logging(format!("no file name in {}", path.display())))?;
    std::fs::create_dir_all(dir)?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .try_init()
        .map_err(|e| LifecycleError::Logging(e.to_string()))?;

    Ok(Some(guard))
}
