// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory event seam.
//!
//! Delivers paths that appear in a watched directory (created or renamed
//! in). Events are advisory: the kernel queue can overflow and
//! subscriptions can die, so consumers must tolerate missed paths — the
//! scanner is the safety net.

mod fs_events;

pub use fs_events::FsEventWatchAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeWatchAdapter;

use std::any::Any;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Errors from the event subsystem.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to subscribe to {dir}: {message}")]
    Subscribe { dir: PathBuf, message: String },
    #[error("event stream error: {0}")]
    Stream(String),
}

/// Live subscription to one directory.
///
/// Holds the platform watcher alive; dropping the stream ends the
/// subscription.
pub struct WatchStream {
    events: mpsc::Receiver<Result<PathBuf, WatchError>>,
    _guard: Option<Box<dyn Any + Send>>,
}

impl std::fmt::Debug for WatchStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchStream").finish_non_exhaustive()
    }
}

impl WatchStream {
    pub fn new(
        events: mpsc::Receiver<Result<PathBuf, WatchError>>,
        guard: Option<Box<dyn Any + Send>>,
    ) -> Self {
        Self {
            events,
            _guard: guard,
        }
    }

    /// Next event; `None` when the subscription has ended.
    pub async fn next(&mut self) -> Option<Result<PathBuf, WatchError>> {
        self.events.recv().await
    }
}

/// Adapter for create/rename-into events on a directory (non-recursive).
#[async_trait]
pub trait WatchAdapter: Clone + Send + Sync + 'static {
    async fn subscribe(&self, dir: &Path) -> Result<WatchStream, WatchError>;
}
