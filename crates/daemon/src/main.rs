// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bitmover daemon (bitmoverd)
//!
//! Long-running relay from a capture drop directory to a remote HTTP
//! ingest endpoint, under a local disk budget.
//!
//! Architecture:
//! - Discovery: filesystem watcher plus a periodic scanner safety net
//! - Pipeline: mover and uploader pool advancing files through the stage
//!   directories via atomic renames
//! - Purger: keeps staging under the configured disk-usage target

use std::path::PathBuf;
use std::process::ExitCode;

use bitmover_core::Config;
use bitmover_daemon::env;
use bitmover_daemon::lifecycle::{self, LifecycleError, DRAIN_DEADLINE};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let config_path = match parse_args() {
        Ok(ArgAction::Run(path)) => path,
        Ok(ArgAction::Exit) => return ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            eprintln!("Usage: bitmoverd [CONFIG_FILE | --help | --version]");
            return ExitCode::from(2);
        }
    };

    // Config errors print to stderr: logging is not up yet because the log
    // directory comes from the config itself.
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _log_guard = match setup_logging(&config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: failed to set up logging: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_path.display(),
        "starting bitmoverd"
    );

    let mut daemon = match lifecycle::startup(&config).await {
        Ok(daemon) => daemon,
        Err(e) => {
            error!(error = %e, "failed to start daemon");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let (mut sigterm, mut sigint) = match unix_signals() {
        Ok(signals) => signals,
        Err(e) => {
            error!(error = %e, "failed to install signal handlers");
            daemon.shutdown(DRAIN_DEADLINE).await;
            return ExitCode::FAILURE;
        }
    };

    let exit = tokio::select! {
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
            ExitCode::SUCCESS
        }
        _ = sigint.recv() => {
            info!("received SIGINT, shutting down");
            ExitCode::SUCCESS
        }
        fatal = daemon.fatal() => {
            match fatal {
                Some(e) => error!(error = %e, "fatal pipeline error, shutting down"),
                None => error!("all workers exited unexpectedly, shutting down"),
            }
            ExitCode::FAILURE
        }
    };

    daemon.shutdown(DRAIN_DEADLINE).await;
    info!("daemon stopped");
    exit
}

enum ArgAction {
    Run(PathBuf),
    Exit,
}

fn parse_args() -> Result<ArgAction, String> {
    let mut args = std::env::args().skip(1);
    let action = match args.next().as_deref() {
        Some("--version" | "-V" | "-v") => {
            println!("bitmoverd {}", env!("CARGO_PKG_VERSION"));
            ArgAction::Exit
        }
        Some("--help" | "-h" | "help") => {
            println!("bitmoverd {}", env!("CARGO_PKG_VERSION"));
            println!("Bitmover daemon - relays capture files to a remote ingest endpoint");
            println!();
            println!("USAGE:");
            println!("    bitmoverd [CONFIG_FILE]");
            println!();
            println!("CONFIG_FILE defaults to $BITMOVER_CONFIG, then {}.", env::DEFAULT_CONFIG_PATH);
            println!();
            println!("OPTIONS:");
            println!("    -h, --help       Print help information");
            println!("    -V, --version    Print version information");
            ArgAction::Exit
        }
        Some(flag) if flag.starts_with('-') => {
            return Err(format!("unexpected argument '{flag}'"));
        }
        Some(path) => ArgAction::Run(PathBuf::from(path)),
        None => ArgAction::Run(
            env::config_path_from_env()
                .unwrap_or_else(|| PathBuf::from(env::DEFAULT_CONFIG_PATH)),
        ),
    };
    if args.next().is_some() {
        return Err("too many arguments".to_string());
    }
    Ok(action)
}

type UnixSignal = tokio::signal::unix::Signal;

fn unix_signals() -> std::io::Result<(UnixSignal, UnixSignal)> {
    Ok((
        signal(SignalKind::terminate())?,
        signal(SignalKind::interrupt())?,
    ))
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, LifecycleError> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    std::fs::create_dir_all(&config.logger_dir)?;

    let file_appender = tracing_appender::rolling::never(&config.logger_dir, "app.log.jsonl");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(non_blocking))
        .init();

    Ok(guard)
}
