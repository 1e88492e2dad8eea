// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline work items.
//!
//! A file moves through the pipeline as a pair of short-lived tasks: a
//! [`MoveTask`] from discovery until the rename into `worker/`, then an
//! [`UploadTask`] until a terminal upload outcome. Neither task outlives its
//! stage; the directories themselves are the durable state.

use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// Which component discovered a file in the source directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOrigin {
    Watcher,
    Scanner,
}

impl fmt::Display for DiscoveryOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryOrigin::Watcher => write!(f, "watcher"),
            DiscoveryOrigin::Scanner => write!(f, "scanner"),
        }
    }
}

/// A candidate file in `source/`, waiting to be renamed into `worker/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTask {
    /// Absolute path in the source directory.
    pub path: PathBuf,
    pub discovered_at: SystemTime,
    pub origin: DiscoveryOrigin,
}

impl MoveTask {
    pub fn new(path: PathBuf, discovered_at: SystemTime, origin: DiscoveryOrigin) -> Self {
        Self {
            path,
            discovered_at,
            origin,
        }
    }
}

/// A file in `worker/`, waiting for an upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    /// Absolute path in the worker directory.
    pub path: PathBuf,
    pub size: u64,
    /// 1-based number of the next attempt.
    pub attempt: u32,
    /// Earliest time the next attempt may start. `None` means immediately.
    pub not_before: Option<SystemTime>,
}

impl UploadTask {
    /// Task for a file freshly renamed into `worker/`.
    pub fn new(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            attempt: 1,
            not_before: None,
        }
    }

    /// Follow-up task after a transient failure, due at `not_before`.
    pub fn retry(self, not_before: SystemTime) -> Self {
        Self {
            attempt: self.attempt.saturating_add(1),
            not_before: Some(not_before),
            ..self
        }
    }

    /// Basename as UTF-8, falling back to a lossy rendering.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Why a file was routed to `dead_letter/`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadLetterReason {
    /// The remote answered with a non-retryable status code.
    HttpStatus(u16),
}

impl fmt::Display for DeadLetterReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeadLetterReason::HttpStatus(code) => write!(f, "http status {code}"),
        }
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
