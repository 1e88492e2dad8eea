// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake directory-event adapter for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::{WatchAdapter, WatchError, WatchStream};

struct FakeWatchState {
    subscriptions: Vec<mpsc::Sender<Result<PathBuf, WatchError>>>,
    subscribed_dirs: Vec<PathBuf>,
    fail_subscribes: usize,
}

/// Fake watcher: tests emit events by hand and can kill or refuse
/// subscriptions to exercise the re-subscribe path.
#[derive(Clone)]
pub struct FakeWatchAdapter {
    inner: Arc<Mutex<FakeWatchState>>,
}

impl Default for FakeWatchAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeWatchState {
                subscriptions: Vec::new(),
                subscribed_dirs: Vec::new(),
                fail_subscribes: 0,
            })),
        }
    }
}

impl FakeWatchAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver a path to every live subscription.
    pub fn emit(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.inner.lock();
        state
            .subscriptions
            .retain(|tx| tx.try_send(Ok(path.clone())).is_ok());
    }

    /// Deliver a stream error to every live subscription.
    pub fn emit_error(&self, message: &str) {
        let mut state = self.inner.lock();
        state
            .subscriptions
            .retain(|tx| tx.try_send(Err(WatchError::Stream(message.to_string()))).is_ok());
    }

    /// End every live subscription, as if the kernel watch died.
    pub fn close_subscriptions(&self) {
        self.inner.lock().subscriptions.clear();
    }

    /// Make the next `n` subscribe calls fail.
    pub fn fail_next_subscribes(&self, n: usize) {
        self.inner.lock().fail_subscribes = n;
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.lock().subscribed_dirs.len()
    }
}

#[async_trait]
impl WatchAdapter for FakeWatchAdapter {
    async fn subscribe(&self, dir: &Path) -> Result<WatchStream, WatchError> {
        let mut state = self.inner.lock();
        if state.fail_subscribes > 0 {
            state.fail_subscribes -= 1;
            return Err(WatchError::Subscribe {
                dir: dir.to_path_buf(),
                message: "injected failure".to_string(),
            });
        }
        let (tx, rx) = mpsc::channel(256);
        state.subscriptions.push(tx);
        state.subscribed_dirs.push(dir.to_path_buf());
        Ok(WatchStream::new(rx, None))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
