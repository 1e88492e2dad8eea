// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mover: renames candidates from `source/` into `worker/`.
//!
//! Single consumer by design: rename ordering within one directory is
//! trivially serialized, which upholds the one-file-one-stage invariant
//! without locking. A candidate can arrive twice (watcher and scanner);
//! the existing-name check and `NotFound` handling make the second
//! delivery a no-op.

use std::ops::ControlFlow;
use std::path::PathBuf;
use std::time::Duration;

use bitmover_adapters::{FsAdapter, FsError};
use bitmover_core::{MoveTask, UploadTask};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::FatalError;
use crate::queue::{MoveQueue, UploadSender};
use crate::shutdown::Shutdown;

const MAX_RENAME_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone)]
pub struct MoverConfig {
    pub worker_dir: PathBuf,
    /// Spacing between rename retries.
    pub poll_interval: Duration,
}

/// Moves discovered files into `worker/` and feeds the upload queue.
pub struct Mover<F: FsAdapter> {
    config: MoverConfig,
    fs: F,
    queue: MoveQueue,
    upload_tx: UploadSender,
    fatal: mpsc::Sender<FatalError>,
    shutdown: Shutdown,
}

impl<F: FsAdapter> Mover<F> {
    pub fn new(
        config: MoverConfig,
        fs: F,
        queue: MoveQueue,
        upload_tx: UploadSender,
        fatal: mpsc::Sender<FatalError>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            config,
            fs,
            queue,
            upload_tx,
            fatal,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut shutdown = self.shutdown.clone();
        loop {
            let task = tokio::select! {
                task = self.queue.recv() => task,
                _ = shutdown.requested() => break,
            };
            if self.handle(task, &mut shutdown).await.is_break() {
                break;
            }
        }
        tracing::debug!(component = "mover", "stopped");
    }

    async fn handle(&self, task: MoveTask, shutdown: &mut Shutdown) -> ControlFlow<()> {
        let entry = match self.fs.lstat(&task.path).await {
            Ok(entry) => entry,
            Err(e) if e.is_not_found() => {
                tracing::debug!(
                    component = "mover",
                    file = %task.path.display(),
                    "vanished before move"
                );
                return ControlFlow::Continue(());
            }
            Err(e) => {
                tracing::error!(
                    component = "mover",
                    file = %task.path.display(),
                    error = %e,
                    "stat failed, dropping task"
                );
                return ControlFlow::Continue(());
            }
        };

        if !entry.is_regular() {
            tracing::warn!(
                component = "mover",
                file = %task.path.display(),
                "ignoring non-regular file"
            );
            return ControlFlow::Continue(());
        }

        let Some(name) = task.path.file_name() else {
            tracing::warn!(
                component = "mover",
                file = %task.path.display(),
                "path has no file name, dropping task"
            );
            return ControlFlow::Continue(());
        };
        let dest = self.config.worker_dir.join(name);

        // Another delivery of the same file won the rename already.
        match self.fs.exists(&dest).await {
            Ok(true) => {
                tracing::debug!(
                    component = "mover",
                    file = %dest.display(),
                    "already in worker directory"
                );
                return ControlFlow::Continue(());
            }
            Ok(false) => {}
            Err(e) => {
                tracing::error!(
                    component = "mover",
                    file = %dest.display(),
                    error = %e,
                    "existence check failed, dropping task"
                );
                return ControlFlow::Continue(());
            }
        }

        for attempt in 1..=MAX_RENAME_ATTEMPTS {
            match self.fs.rename(&task.path, &dest).await {
                Ok(()) => {
                    tracing::debug!(
                        component = "mover",
                        file = %dest.display(),
                        origin = %task.origin,
                        size = entry.size,
                        "moved to worker directory"
                    );
                    let upload = UploadTask::new(dest.clone(), entry.size);
                    // Blocks when the upload queue is full: backpressure
                    // reaches source/ and the purger is the relief.
                    tokio::select! {
                        result = self.upload_tx.send(upload) => {
                            if result.is_err() {
                                return ControlFlow::Break(());
                            }
                        }
                        _ = shutdown.requested() => {
                            // File stays in worker/; startup recovery
                            // re-enqueues it on the next run.
                            return ControlFlow::Break(());
                        }
                    }
                    return ControlFlow::Continue(());
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(
                        component = "mover",
                        file = %task.path.display(),
                        "vanished mid-move"
                    );
                    return ControlFlow::Continue(());
                }
                Err(e @ FsError::CrossDevice { .. }) => {
                    tracing::error!(
                        component = "mover",
                        error = %e,
                        "stage directories are not on one filesystem"
                    );
                    let _ = self.fatal.send(FatalError::CrossDevice(e)).await;
                    return ControlFlow::Break(());
                }
                Err(e) => {
                    tracing::warn!(
                        component = "mover",
                        file = %task.path.display(),
                        attempt,
                        error = %e,
                        "rename failed"
                    );
                    if attempt < MAX_RENAME_ATTEMPTS
                        && shutdown.sleep_interrupted(self.config.poll_interval).await
                    {
                        return ControlFlow::Break(());
                    }
                }
            }
        }

        tracing::warn!(
            component = "mover",
            file = %task.path.display(),
            "giving up after {MAX_RENAME_ATTEMPTS} rename attempts; scanner will rediscover"
        );
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
#[path = "mover_tests.rs"]
mod tests;
