// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Uploader pool: drives each `worker/` file to a terminal outcome.
//!
//! Outcome classification per attempt:
//!
//! - 2xx: rename to `uploaded/`.
//! - 4xx other than 408/429: rename to `dead_letter/`.
//! - 408, 429, 5xx, or any transport error: transient — re-queue with
//!   exponential backoff.
//!
//! Attempts are unbounded; the purger is the release valve for files that
//! never succeed. A file missing at attempt time means the purger (or a
//! racing worker) already handled it, which is benign.

use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bitmover_adapters::{FsAdapter, HttpAdapter, UploadRequest};
use bitmover_core::{Clock, DeadLetterReason, RetryPolicy, UploadTask};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use url::Url;

use crate::audit::{AuditLogger, AuditRecord};
use crate::queue::{UploadReceiver, UploadSender};
use crate::shutdown::Shutdown;

#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub remote_url: Url,
    pub worker_dir: PathBuf,
    pub uploaded_dir: PathBuf,
    pub dead_letter_dir: PathBuf,
    /// Idle wakeup interval while the queue is empty.
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub retry_policy: RetryPolicy,
    /// Pool size.
    pub workers: usize,
}

/// Spawns the upload worker pool over one shared queue receiver.
pub struct UploaderPool;

impl UploaderPool {
    pub fn spawn<F: FsAdapter, H: HttpAdapter, C: Clock>(
        config: UploaderConfig,
        fs: F,
        http: H,
        clock: C,
        queue_tx: UploadSender,
        queue_rx: UploadReceiver,
        audit: AuditLogger,
        shutdown: Shutdown,
    ) -> Vec<JoinHandle<()>> {
        let config = Arc::new(config);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        (0..config.workers.max(1))
            .map(|id| {
                let worker = UploadWorker {
                    id,
                    config: Arc::clone(&config),
                    fs: fs.clone(),
                    http: http.clone(),
                    clock: clock.clone(),
                    queue_rx: Arc::clone(&queue_rx),
                    queue_tx: queue_tx.clone(),
                    audit: audit.clone(),
                    shutdown: shutdown.clone(),
                };
                tokio::spawn(worker.run())
            })
            .collect()
    }
}

/// Result of one upload attempt.
enum Attempt {
    Success(u16),
    Permanent(u16),
    Transient { status: Option<u16>, error: String },
    /// File vanished before the attempt; nothing left to do.
    Missing,
}

#[derive(Default)]
struct HeartbeatCounters {
    attempts: u64,
    successes: u64,
    transient: u64,
    permanent: u64,
}

struct UploadWorker<F: FsAdapter, H: HttpAdapter, C: Clock> {
    id: usize,
    config: Arc<UploaderConfig>,
    fs: F,
    http: H,
    clock: C,
    queue_rx: Arc<Mutex<UploadReceiver>>,
    queue_tx: UploadSender,
    audit: AuditLogger,
    shutdown: Shutdown,
}

impl<F: FsAdapter, H: HttpAdapter, C: Clock> UploadWorker<F, H, C> {
    async fn run(self) {
        let mut shutdown = self.shutdown.clone();
        let mut counters = HeartbeatCounters::default();
        let mut last_heartbeat = Instant::now();

        loop {
            let task = tokio::select! {
                task = Self::next_task(&self.queue_rx) => match task {
                    Some(task) => Some(task),
                    None => break,
                },
                _ = tokio::time::sleep(self.config.poll_interval) => None,
                _ = shutdown.requested() => break,
            };

            if let Some(task) = task {
                if self
                    .process(task, &mut shutdown, &mut counters)
                    .await
                    .is_break()
                {
                    break;
                }
            }

            if last_heartbeat.elapsed() >= self.config.heartbeat_interval {
                self.emit_heartbeat(&counters);
                counters = HeartbeatCounters::default();
                last_heartbeat = Instant::now();
            }
        }

        tracing::debug!(component = "uploader", worker = self.id, "stopped");
    }

    async fn next_task(queue_rx: &Arc<Mutex<UploadReceiver>>) -> Option<UploadTask> {
        queue_rx.lock().await.recv().await
    }

    async fn process(
        &self,
        mut task: UploadTask,
        shutdown: &mut Shutdown,
        counters: &mut HeartbeatCounters,
    ) -> ControlFlow<()> {
        loop {
            if let Some(due) = task.not_before {
                let wait = due
                    .duration_since(self.clock.now())
                    .unwrap_or(Duration::ZERO);
                if !wait.is_zero() && shutdown.sleep_interrupted(wait).await {
                    // File stays in worker/; startup recovery re-queues it.
                    return ControlFlow::Break(());
                }
            }

            counters.attempts += 1;
            let started = Instant::now();
            let outcome = self.attempt(&task).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Attempt::Missing => {
                    tracing::debug!(
                        component = "uploader",
                        worker = self.id,
                        file = %task.path.display(),
                        "file gone before upload"
                    );
                    return ControlFlow::Continue(());
                }
                Attempt::Success(status) => {
                    counters.successes += 1;
                    self.archive(&task, &self.config.uploaded_dir).await;
                    self.audit.record(&AuditRecord::success(
                        task.file_name(),
                        task.size,
                        task.attempt,
                        &self.config.remote_url,
                        status,
                        duration_ms,
                    ));
                    tracing::info!(
                        component = "uploader",
                        worker = self.id,
                        file = %task.file_name(),
                        attempt = task.attempt,
                        status,
                        duration_ms,
                        "uploaded"
                    );
                    return ControlFlow::Continue(());
                }
                Attempt::Permanent(status) => {
                    counters.permanent += 1;
                    let reason = DeadLetterReason::HttpStatus(status);
                    self.archive(&task, &self.config.dead_letter_dir).await;
                    self.audit.record(&AuditRecord::permanent(
                        task.file_name(),
                        task.size,
                        task.attempt,
                        &self.config.remote_url,
                        status,
                        reason.to_string(),
                        duration_ms,
                    ));
                    tracing::warn!(
                        component = "uploader",
                        worker = self.id,
                        file = %task.file_name(),
                        attempt = task.attempt,
                        status,
                        "dead-lettered"
                    );
                    return ControlFlow::Continue(());
                }
                Attempt::Transient { status, error } => {
                    counters.transient += 1;
                    self.audit.record(&AuditRecord::transient(
                        task.file_name(),
                        task.size,
                        task.attempt,
                        &self.config.remote_url,
                        status,
                        error.clone(),
                        duration_ms,
                    ));
                    let delay = self.config.retry_policy.delay(task.attempt);
                    tracing::warn!(
                        component = "uploader",
                        worker = self.id,
                        file = %task.file_name(),
                        attempt = task.attempt,
                        error = %error,
                        retry_in_ms = delay.as_millis() as u64,
                        "transient upload failure"
                    );
                    task = task.retry(self.clock.now() + delay);
                    match self.queue_tx.try_send(task) {
                        Ok(()) => return ControlFlow::Continue(()),
                        // Queue full: keep the task and retry in place
                        // after its backoff, instead of blocking a slot
                        // every worker might need.
                        Err(TrySendError::Full(held)) => task = held,
                        Err(TrySendError::Closed(_)) => return ControlFlow::Break(()),
                    }
                }
            }
        }
    }

    async fn attempt(&self, task: &UploadTask) -> Attempt {
        let body = match self.fs.open_read(&task.path).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => return Attempt::Missing,
            Err(e) => {
                return Attempt::Transient {
                    status: None,
                    error: e.to_string(),
                }
            }
        };

        let request = UploadRequest {
            url: self.config.remote_url.clone(),
            filename: task.file_name(),
            size: task.size,
            body,
        };
        match self.http.post_file(request).await {
            Ok(status) if (200..300).contains(&status) => Attempt::Success(status),
            Ok(status @ (408 | 429)) => Attempt::Transient {
                status: Some(status),
                error: format!("http status {status}"),
            },
            Ok(status) if (500..600).contains(&status) => Attempt::Transient {
                status: Some(status),
                error: format!("http status {status}"),
            },
            Ok(status) => Attempt::Permanent(status),
            Err(e) => Attempt::Transient {
                status: None,
                error: e.to_string(),
            },
        }
    }

    /// Move a terminally-handled file out of `worker/`. `NotFound` means
    /// the purger won the race, which is fine.
    async fn archive(&self, task: &UploadTask, dest_dir: &Path) {
        let Some(name) = task.path.file_name() else {
            return;
        };
        let dest = dest_dir.join(name);
        match self.fs.rename(&task.path, &dest).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(
                    component = "uploader",
                    file = %task.path.display(),
                    "vanished before archive rename"
                );
            }
            Err(e) => {
                tracing::error!(
                    component = "uploader",
                    file = %task.path.display(),
                    dest = %dest.display(),
                    error = %e,
                    "failed to archive file"
                );
            }
        }
    }

    fn emit_heartbeat(&self, counters: &HeartbeatCounters) {
        let queue_depth = self.queue_tx.max_capacity() - self.queue_tx.capacity();
        tracing::info!(
            component = "uploader",
            worker = self.id,
            attempts = counters.attempts,
            successes = counters.successes,
            transient_failures = counters.transient,
            permanent_failures = counters.permanent,
            queue_depth,
            "uploader heartbeat"
        );
    }
}

#[cfg(test)]
#[path = "uploader_tests.rs"]
mod tests;
