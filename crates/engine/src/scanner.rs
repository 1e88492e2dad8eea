// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic source-directory sweep: the discovery safety net.
//!
//! The watcher is advisory; the scanner is the guarantee. Every tick it
//! enumerates `source/` and classifies each capture file by mtime age:
//!
//! - **active** — young, or still growing between ticks: leave it alone,
//!   the watcher (or a later tick) will pick it up once it settles.
//! - **lost** — older than `lost_timeout`: the watcher likely missed it;
//!   enqueue it for moving.
//! - **stuck** — older than `stuck_timeout`: presumed abandoned by a
//!   crashed producer; enqueue it anyway (a corrupt file dead-letters at
//!   upload) and warn.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use bitmover_adapters::{FsAdapter, FsError};
use bitmover_core::{has_extension, Clock, DiscoveryOrigin, FileEntry, MoveTask};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::FatalError;
use crate::queue::{MoveQueue, Submit};
use crate::shutdown::Shutdown;

/// Growth-map entries unseen for this many ticks are evicted.
const EVICT_AFTER_TICKS: u64 = 3;

/// Consecutive failed sweeps before the scanner escalates to the
/// supervisor.
const MAX_CONSECUTIVE_SCAN_FAILURES: u32 = 5;

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub source_dir: PathBuf,
    /// Capture extension, without the dot.
    pub pcap_extension: String,
    pub check_interval: Duration,
    /// Age past which a file is presumed missed by the watcher.
    pub lost_timeout: Duration,
    /// Age past which a file is presumed abandoned by its producer.
    /// Config validation guarantees this exceeds `lost_timeout`.
    pub stuck_timeout: Duration,
}

struct SeenFile {
    size: u64,
    last_seen_tick: u64,
}

/// Sweeps `source/` on a fixed interval and rescues files the watcher
/// missed.
pub struct Scanner<F: FsAdapter, C: Clock> {
    config: ScannerConfig,
    fs: F,
    clock: C,
    queue: MoveQueue,
    fatal: mpsc::Sender<FatalError>,
    shutdown: Shutdown,
    seen: HashMap<PathBuf, SeenFile>,
    tick_count: u64,
    consecutive_failures: u32,
}

impl<F: FsAdapter, C: Clock> Scanner<F, C> {
    pub fn new(
        config: ScannerConfig,
        fs: F,
        clock: C,
        queue: MoveQueue,
        fatal: mpsc::Sender<FatalError>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            config,
            fs,
            clock,
            queue,
            fatal,
            shutdown,
            seen: HashMap::new(),
            tick_count: 0,
            consecutive_failures: 0,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        let mut shutdown = self.shutdown.clone();
        loop {
            if shutdown.sleep_interrupted(self.config.check_interval).await {
                break;
            }
            self.tick().await;
            if self.consecutive_failures >= MAX_CONSECUTIVE_SCAN_FAILURES {
                tracing::error!(
                    component = "scanner",
                    failures = self.consecutive_failures,
                    "source directory unreadable, escalating"
                );
                let _ = self
                    .fatal
                    .send(FatalError::PersistentIo {
                        component: "scanner",
                        source: FsError::NotFound(self.config.source_dir.clone()),
                    })
                    .await;
                break;
            }
        }
        tracing::debug!(component = "scanner", "stopped");
    }

    async fn tick(&mut self) {
        self.tick_count += 1;
        let entries = match self.fs.scan_dir(&self.config.source_dir).await {
            Ok(entries) => {
                self.consecutive_failures = 0;
                entries
            }
            Err(FsError::Permission(path)) => {
                // Permission problems are an operator concern, not a
                // liveness one; keep ticking.
                tracing::error!(
                    component = "scanner",
                    dir = %path.display(),
                    "permission denied scanning source directory"
                );
                return;
            }
            Err(e) => {
                self.consecutive_failures += 1;
                tracing::error!(
                    component = "scanner",
                    error = %e,
                    failures = self.consecutive_failures,
                    "source scan failed"
                );
                return;
            }
        };

        let now = self.clock.now();
        for entry in &entries {
            if !entry.is_regular() || !has_extension(&entry.path, &self.config.pcap_extension) {
                continue;
            }
            self.classify(entry, now);
        }
        self.evict_stale();
    }

    fn classify(&mut self, entry: &FileEntry, now: std::time::SystemTime) {
        let growing = self
            .seen
            .get(&entry.path)
            .is_some_and(|seen| seen.size != entry.size);
        self.seen.insert(
            entry.path.clone(),
            SeenFile {
                size: entry.size,
                last_seen_tick: self.tick_count,
            },
        );

        if growing {
            // Still being written; rescuing it now would move a partial
            // capture.
            tracing::debug!(
                component = "scanner",
                file = %entry.path.display(),
                "file still growing"
            );
            return;
        }

        let age = entry.age(now);
        if age <= self.config.lost_timeout {
            return;
        }

        if age > self.config.stuck_timeout {
            tracing::warn!(
                component = "scanner",
                file = %entry.path.display(),
                age_s = age.as_secs(),
                "stuck file, presumed abandoned by producer; moving anyway"
            );
        } else {
            tracing::info!(
                component = "scanner",
                file = %entry.path.display(),
                age_s = age.as_secs(),
                "rescuing file missed by watcher"
            );
        }

        let task = MoveTask::new(entry.path.clone(), now, DiscoveryOrigin::Scanner);
        match self.queue.submit(task) {
            Submit::Enqueued => {}
            Submit::Duplicate => {
                tracing::debug!(
                    component = "scanner",
                    file = %entry.path.display(),
                    "already queued"
                );
            }
            Submit::DroppedOldest(dropped) => {
                tracing::warn!(
                    component = "scanner",
                    file = %entry.path.display(),
                    dropped = %dropped.display(),
                    "move queue full, shed oldest entry"
                );
            }
        }
    }

    fn evict_stale(&mut self) {
        let tick = self.tick_count;
        self.seen
            .retain(|_, seen| tick - seen.last_seen_tick < EVICT_AFTER_TICKS);
    }
}

#[cfg(test)]
#[path = "scanner_tests.rs"]
mod tests;
