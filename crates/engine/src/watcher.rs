// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source-directory watcher: the advisory first line of discovery.
//!
//! Filesystem events are best-effort — the kernel queue can overflow and a
//! subscription can die under load. The watcher therefore only accelerates
//! discovery; the scanner guarantees it. Event-system failures are never
//! fatal: the watcher logs, backs off, and re-subscribes.

use std::path::PathBuf;
use std::time::Duration;

use bitmover_adapters::{WatchAdapter, WatchStream};
use bitmover_core::{has_extension, Clock, DiscoveryOrigin, MoveTask};
use tokio::task::JoinHandle;

use crate::queue::{MoveQueue, Submit};
use crate::shutdown::Shutdown;

const RESUBSCRIBE_INITIAL: Duration = Duration::from_secs(1);
const RESUBSCRIBE_MAX: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    pub source_dir: PathBuf,
    /// Capture extension, without the dot.
    pub pcap_extension: String,
    /// Idle wakeup interval while waiting for events.
    pub poll_timeout: Duration,
}

/// Watches `source/` and feeds the move queue.
pub struct Watcher<W: WatchAdapter, C: Clock> {
    config: WatcherConfig,
    watch: W,
    clock: C,
    queue: MoveQueue,
    shutdown: Shutdown,
}

impl<W: WatchAdapter, C: Clock> Watcher<W, C> {
    pub fn new(
        config: WatcherConfig,
        watch: W,
        clock: C,
        queue: MoveQueue,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            config,
            watch,
            clock,
            queue,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut shutdown = self.shutdown.clone();
        let mut backoff = RESUBSCRIBE_INITIAL;

        loop {
            if shutdown.is_requested() {
                break;
            }
            let mut stream = match self.watch.subscribe(&self.config.source_dir).await {
                Ok(stream) => {
                    tracing::info!(
                        component = "watcher",
                        dir = %self.config.source_dir.display(),
                        "watching source directory"
                    );
                    backoff = RESUBSCRIBE_INITIAL;
                    stream
                }
                Err(e) => {
                    tracing::warn!(
                        component = "watcher",
                        error = %e,
                        retry_in_s = backoff.as_secs(),
                        "subscribe failed, retrying"
                    );
                    if shutdown.sleep_interrupted(backoff).await {
                        break;
                    }
                    backoff = (backoff * 2).min(RESUBSCRIBE_MAX);
                    continue;
                }
            };

            if self.pump(&mut stream, &mut shutdown).await {
                break;
            }

            tracing::warn!(
                component = "watcher",
                retry_in_s = backoff.as_secs(),
                "event stream ended, re-subscribing"
            );
            if shutdown.sleep_interrupted(backoff).await {
                break;
            }
            backoff = (backoff * 2).min(RESUBSCRIBE_MAX);
        }

        tracing::debug!(component = "watcher", "stopped");
    }

    /// Drain events until the stream dies or shutdown fires. Returns true
    /// on shutdown.
    async fn pump(&self, stream: &mut WatchStream, shutdown: &mut Shutdown) -> bool {
        loop {
            tokio::select! {
                event = stream.next() => match event {
                    Some(Ok(path)) => self.handle_path(path),
                    Some(Err(e)) => {
                        tracing::warn!(component = "watcher", error = %e, "event stream error");
                        return false;
                    }
                    None => return false,
                },
                _ = tokio::time::sleep(self.config.poll_timeout) => {
                    tracing::trace!(
                        component = "watcher",
                        queue_depth = self.queue.len(),
                        "idle"
                    );
                }
                _ = shutdown.requested() => return true,
            }
        }
    }

    fn handle_path(&self, path: PathBuf) {
        if !has_extension(&path, &self.config.pcap_extension) {
            return;
        }
        let task = MoveTask::new(path.clone(), self.clock.now(), DiscoveryOrigin::Watcher);
        match self.queue.submit(task) {
            Submit::Enqueued => {
                tracing::debug!(
                    component = "watcher",
                    file = %path.display(),
                    "queued for move"
                );
            }
            Submit::Duplicate => {
                tracing::debug!(
                    component = "watcher",
                    file = %path.display(),
                    "already queued"
                );
            }
            Submit::DroppedOldest(dropped) => {
                tracing::warn!(
                    component = "watcher",
                    file = %path.display(),
                    dropped = %dropped.display(),
                    "move queue full, shed oldest entry"
                );
            }
        }
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
