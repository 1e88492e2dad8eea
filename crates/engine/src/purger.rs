// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Purger: keeps the staging filesystem under its disk budget.
//!
//! Deletion policy, in order: regular files under `uploaded/` (already
//! delivered, safe to drop), then `worker/` (not yet delivered — each
//! deletion is audited as `purged_before_upload`). Files under `source/`,
//! `csv/`, and `dead_letter/` are never touched: source files would be
//! lost outright, csv files are operator diagnostics, and dead-letter
//! files are the only evidence of permanent failures.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::Duration;

use bitmover_adapters::{FsAdapter, FsError};
use bitmover_core::FileEntry;
use tokio::task::JoinHandle;
use url::Url;

use crate::audit::{AuditLogger, AuditRecord};
use crate::shutdown::Shutdown;

#[derive(Debug, Clone)]
pub struct PurgerConfig {
    pub base_dir: PathBuf,
    pub source_dir: PathBuf,
    pub worker_dir: PathBuf,
    pub uploaded_dir: PathBuf,
    pub dead_letter_dir: PathBuf,
    pub csv_dir: PathBuf,
    pub poll_interval: Duration,
    /// Usage ceiling as a fraction of capacity (0, 1).
    pub target_disk_usage: f64,
    /// Capacity in bytes; 0 means autodetect from the filesystem.
    pub total_capacity_bytes: u64,
    /// Ingest URL, recorded in purge audit records.
    pub remote_url: Url,
}

/// Point-in-time view of staging disk state, built each tick.
pub struct DiskSnapshot {
    pub total_bytes: u64,
    pub used_bytes: u64,
    /// Purge candidates in deletion order.
    pub candidates: Vec<FileEntry>,
}

/// Deletes delivered (then undelivered) files until usage is at or under
/// the target.
pub struct Purger<F: FsAdapter> {
    config: PurgerConfig,
    fs: F,
    audit: AuditLogger,
    shutdown: Shutdown,
}

/// Stable total order for purge candidates: oldest mtime first, then
/// smallest size, then path.
pub fn purge_order(a: &FileEntry, b: &FileEntry) -> Ordering {
    a.mtime
        .cmp(&b.mtime)
        .then(a.size.cmp(&b.size))
        .then(a.path.cmp(&b.path))
}

impl<F: FsAdapter> Purger<F> {
    pub fn new(config: PurgerConfig, fs: F, audit: AuditLogger, shutdown: Shutdown) -> Self {
        Self {
            config,
            fs,
            audit,
            shutdown,
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    pub async fn run(self) {
        let mut shutdown = self.shutdown.clone();
        loop {
            if shutdown.sleep_interrupted(self.config.poll_interval).await {
                break;
            }
            self.tick().await;
        }
        tracing::debug!(component = "purger", "stopped");
    }

    async fn tick(&self) {
        let total = match self.capacity().await {
            Some(total) => total,
            None => return,
        };
        let snapshot = match self.snapshot(total).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!(component = "purger", error = %e, "failed to snapshot staging dirs");
                return;
            }
        };

        let utilization = snapshot.used_bytes as f64 / total as f64;
        if utilization <= self.config.target_disk_usage {
            tracing::debug!(
                component = "purger",
                used_bytes = snapshot.used_bytes,
                total_bytes = total,
                utilization,
                "under target, nothing to purge"
            );
            return;
        }

        let target_bytes = (self.config.target_disk_usage * total as f64) as u64;
        let considered = snapshot.candidates.len();
        let mut freed: u64 = 0;
        let mut deleted: usize = 0;

        for entry in &snapshot.candidates {
            if snapshot.used_bytes.saturating_sub(freed) <= target_bytes {
                break;
            }
            match self.fs.unlink(&entry.path).await {
                Ok(()) => {
                    freed += entry.size;
                    deleted += 1;
                    if entry.path.starts_with(&self.config.worker_dir) {
                        let name = entry
                            .file_name()
                            .map(str::to_string)
                            .unwrap_or_else(|| entry.path.display().to_string());
                        self.audit.record(&AuditRecord::purged(
                            name,
                            entry.size,
                            &self.config.remote_url,
                        ));
                        tracing::warn!(
                            component = "purger",
                            file = %entry.path.display(),
                            size = entry.size,
                            "purged file before upload"
                        );
                    } else {
                        tracing::debug!(
                            component = "purger",
                            file = %entry.path.display(),
                            size = entry.size,
                            "purged uploaded file"
                        );
                    }
                }
                // The uploader archived or an operator removed it; the
                // space is accounted for either way.
                Err(e) if e.is_not_found() => {}
                Err(e) => {
                    tracing::warn!(
                        component = "purger",
                        file = %entry.path.display(),
                        error = %e,
                        "unlink failed, skipping"
                    );
                }
            }
        }

        let used_after = snapshot.used_bytes.saturating_sub(freed);
        tracing::info!(
            component = "purger",
            considered,
            deleted,
            bytes_freed = freed,
            utilization = used_after as f64 / total as f64,
            "purge tick complete"
        );
    }

    /// Configured capacity, or the filesystem's when configured as 0.
    async fn capacity(&self) -> Option<u64> {
        if self.config.total_capacity_bytes > 0 {
            return Some(self.config.total_capacity_bytes);
        }
        match self.fs.disk_usage(&self.config.base_dir).await {
            Ok(usage) if usage.total_bytes > 0 => Some(usage.total_bytes),
            Ok(_) => {
                tracing::warn!(
                    component = "purger",
                    "filesystem reports zero capacity, skipping tick"
                );
                None
            }
            Err(e) => {
                tracing::error!(component = "purger", error = %e, "capacity query failed");
                None
            }
        }
    }

    async fn snapshot(&self, total: u64) -> Result<DiskSnapshot, FsError> {
        let source = self.list_regular(&self.config.source_dir).await?;
        let mut worker = self.list_regular(&self.config.worker_dir).await?;
        let mut uploaded = self.list_regular(&self.config.uploaded_dir).await?;
        let dead_letter = self.list_regular(&self.config.dead_letter_dir).await?;
        let csv = self.list_regular(&self.config.csv_dir).await?;

        let used_bytes = [&source, &worker, &uploaded, &dead_letter, &csv]
            .iter()
            .flat_map(|entries| entries.iter())
            .map(|entry| entry.size)
            .sum();

        uploaded.sort_by(purge_order);
        worker.sort_by(purge_order);

        let mut candidates = uploaded;
        candidates.extend(worker);

        Ok(DiskSnapshot {
            total_bytes: total,
            used_bytes,
            candidates,
        })
    }

    async fn list_regular(&self, dir: &Path) -> Result<Vec<FileEntry>, FsError> {
        match self.fs.scan_dir(dir).await {
            Ok(entries) => Ok(entries
                .into_iter()
                .filter(FileEntry::is_regular)
                .collect()),
            // A stage directory that does not exist yet holds no bytes.
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
#[path = "purger_tests.rs"]
mod tests;
