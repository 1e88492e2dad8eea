// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle: startup, drain, shutdown.
//!
//! The supervisor owns the phase transitions `Starting → Running →
//! Draining → Stopped`. Startup verifies the stage directories (creating
//! missing ones and enforcing the single-filesystem invariant), re-queues
//! files left in `worker/` by a previous run, and spawns the workers in
//! dependency order. Shutdown signals every worker, waits for the watcher
//! first so no new discoveries enter the pipeline, and abandons stragglers
//! at the drain deadline — their files stay in `worker/` for the next run.

use std::path::PathBuf;
use std::time::Duration;

use bitmover_adapters::{
    FsAdapter, FsError, FsEventWatchAdapter, HttpAdapter, HttpError, ReqwestHttpAdapter,
    TokioFsAdapter, WatchAdapter,
};
use bitmover_core::{has_extension, Clock, Config, ConfigError, SystemClock, UploadTask};
use bitmover_engine::{
    shutdown_channel, upload_channel, AuditLogger, FatalError, MoveQueue, Mover, MoverConfig,
    Purger, PurgerConfig, Scanner, ScannerConfig, ShutdownTrigger, UploaderConfig, UploaderPool,
    UploadSender, Watcher, WatcherConfig, DEFAULT_QUEUE_CAPACITY,
};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// How long shutdown waits for workers to finish their current unit of
/// work before abandoning them.
pub const DRAIN_DEADLINE: Duration = Duration::from_secs(10);

/// Process-wide lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    Draining,
    Stopped,
}

/// Errors that abort startup. All are fatal; the process exits non-zero.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("filesystem error during startup: {0}")]
    Fs(#[from] FsError),
    #[error("failed to build http client: {0}")]
    Http(#[from] HttpError),
    #[error("stage directories must share one filesystem: {left} and {right} are on different devices")]
    DeviceMismatch { left: PathBuf, right: PathBuf },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A running pipeline: worker handles plus the shutdown trigger.
pub struct Daemon {
    phase: Phase,
    trigger: ShutdownTrigger,
    fatal_rx: mpsc::Receiver<FatalError>,
    /// Watcher first, then scanner, mover, uploaders, purger, recovery.
    handles: Vec<JoinHandle<()>>,
}

impl Daemon {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Wait for a fatal worker error. `None` means every fatal sender is
    /// gone — the workers all exited.
    pub async fn fatal(&mut self) -> Option<FatalError> {
        self.fatal_rx.recv().await
    }

    /// Drain the pipeline and stop. Workers still running at the deadline
    /// are aborted; in-flight files stay in `worker/` for the next run.
    pub async fn shutdown(mut self, deadline: Duration) {
        self.phase = Phase::Draining;
        tracing::info!(phase = "draining", "shutting down pipeline");
        self.trigger.trigger();

        let mut handles = std::mem::take(&mut self.handles);
        let drain = async {
            // In-order wait: the watcher is first in the list, so it is
            // confirmed gone before the rest are reaped.
            for handle in &mut handles {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(deadline, drain).await.is_err() {
            tracing::warn!(
                deadline_s = deadline.as_secs(),
                "drain deadline exceeded, abandoning in-flight work"
            );
            for handle in &handles {
                handle.abort();
            }
        }

        self.phase = Phase::Stopped;
        tracing::info!(phase = "stopped", "pipeline stopped");
    }
}

/// Start the daemon with production adapters.
pub async fn startup(config: &Config) -> Result<Daemon, LifecycleError> {
    let http = ReqwestHttpAdapter::new(config.verify_ssl, config.request_timeout)?;
    startup_with(
        config,
        TokioFsAdapter::new(),
        http,
        FsEventWatchAdapter::new(),
        SystemClock,
    )
    .await
}

/// Start the daemon with caller-supplied adapters.
pub async fn startup_with<F, H, W, C>(
    config: &Config,
    fs: F,
    http: H,
    watch: W,
    clock: C,
) -> Result<Daemon, LifecycleError>
where
    F: FsAdapter,
    H: HttpAdapter,
    W: WatchAdapter,
    C: Clock,
{
    tracing::info!(
        phase = "starting",
        base_dir = %config.base_dir.display(),
        "starting pipeline"
    );

    let stage_dirs = [
        config.source_dir(),
        config.worker_dir(),
        config.uploaded_dir(),
        config.dead_letter_dir(),
        config.csv_dir(),
    ];
    for dir in &stage_dirs {
        fs.mkdir_p(dir).await?;
    }
    fs.mkdir_p(&config.logger_dir).await?;
    verify_single_filesystem(&fs, &stage_dirs).await?;

    let audit = AuditLogger::new(config.audit_log_path());
    let move_queue = MoveQueue::new(DEFAULT_QUEUE_CAPACITY);
    let (upload_tx, upload_rx) = upload_channel(DEFAULT_QUEUE_CAPACITY);
    let (trigger, shutdown) = shutdown_channel();
    let (fatal_tx, fatal_rx) = mpsc::channel(8);

    let mut handles = Vec::new();

    let watcher = Watcher::new(
        WatcherConfig {
            source_dir: config.source_dir(),
            pcap_extension: config.pcap_extension.clone(),
            poll_timeout: config.event_queue_poll_timeout,
        },
        watch,
        clock.clone(),
        move_queue.clone(),
        shutdown.clone(),
    );
    handles.push(watcher.spawn());

    let scanner = Scanner::new(
        ScannerConfig {
            source_dir: config.source_dir(),
            pcap_extension: config.pcap_extension.clone(),
            check_interval: config.scanner_check_interval,
            lost_timeout: config.lost_timeout,
            stuck_timeout: config.stuck_active_file_timeout,
        },
        fs.clone(),
        clock.clone(),
        move_queue.clone(),
        fatal_tx.clone(),
        shutdown.clone(),
    );
    handles.push(scanner.spawn());

    let mover = Mover::new(
        MoverConfig {
            worker_dir: config.worker_dir(),
            poll_interval: config.move_poll_interval,
        },
        fs.clone(),
        move_queue,
        upload_tx.clone(),
        fatal_tx,
        shutdown.clone(),
    );
    handles.push(mover.spawn());

    handles.extend(UploaderPool::spawn(
        UploaderConfig {
            remote_url: config.remote_host_url.clone(),
            worker_dir: config.worker_dir(),
            uploaded_dir: config.uploaded_dir(),
            dead_letter_dir: config.dead_letter_dir(),
            poll_interval: config.uploader_poll_interval,
            heartbeat_interval: config.heartbeat_interval,
            retry_policy: config.retry_policy(),
            workers: config.uploader_workers,
        },
        fs.clone(),
        http,
        clock,
        upload_tx.clone(),
        upload_rx,
        audit.clone(),
        shutdown.clone(),
    ));

    let purger = Purger::new(
        PurgerConfig {
            base_dir: config.base_dir.clone(),
            source_dir: config.source_dir(),
            worker_dir: config.worker_dir(),
            uploaded_dir: config.uploaded_dir(),
            dead_letter_dir: config.dead_letter_dir(),
            csv_dir: config.csv_dir(),
            poll_interval: config.purger_poll_interval,
            target_disk_usage: config.target_disk_usage,
            total_capacity_bytes: config.total_disk_capacity_bytes,
            remote_url: config.remote_host_url.clone(),
        },
        fs.clone(),
        audit,
        shutdown,
    );
    handles.push(purger.spawn());

    // A previous run may have left files mid-pipeline; re-queue them.
    handles.push(tokio::spawn(recover_worker_files(
        fs,
        config.worker_dir(),
        config.pcap_extension.clone(),
        upload_tx,
    )));

    tracing::info!(phase = "running", "pipeline running");
    Ok(Daemon {
        phase: Phase::Running,
        trigger,
        fatal_rx,
        handles,
    })
}

/// Compare device ids across the stage directories; a mismatch breaks the
/// atomic-rename invariant and is fatal.
async fn verify_single_filesystem<F: FsAdapter>(
    fs: &F,
    dirs: &[PathBuf],
) -> Result<(), LifecycleError> {
    let Some(first) = dirs.first() else {
        return Ok(());
    };
    let expected = fs.device_id(first).await?;
    for dir in &dirs[1..] {
        let device = fs.device_id(dir).await?;
        if device != expected {
            return Err(LifecycleError::DeviceMismatch {
                left: first.clone(),
                right: dir.clone(),
            });
        }
    }
    Ok(())
}

/// Re-queue files left in `worker/` by a previous run. Upload-queue sends
/// block until the pool drains them, which is fine in a spawned task.
async fn recover_worker_files<F: FsAdapter>(
    fs: F,
    worker_dir: PathBuf,
    pcap_extension: String,
    upload_tx: UploadSender,
) {
    let entries = match fs.scan_dir(&worker_dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::error!(component = "recovery", error = %e, "failed to scan worker directory");
            return;
        }
    };

    let mut recovered = 0usize;
    for entry in entries {
        if !entry.is_regular() || !has_extension(&entry.path, &pcap_extension) {
            continue;
        }
        let task = UploadTask::new(entry.path.clone(), entry.size);
        if upload_tx.send(task).await.is_err() {
            return;
        }
        recovered += 1;
    }
    if recovered > 0 {
        tracing::info!(component = "recovery", recovered, "re-queued files from previous run");
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
