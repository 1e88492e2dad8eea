// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cooperative shutdown signal.
//!
//! One [`ShutdownTrigger`] is owned by the supervisor; every worker holds a
//! [`Shutdown`] clone and races its waits against it. Workers finish their
//! current unit of work and exit — nothing is interrupted mid-rename.

use std::time::Duration;

use tokio::sync::watch;

/// Create a linked trigger/signal pair.
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

/// Owning side of the shutdown signal.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    /// Signal every [`Shutdown`] clone. Idempotent.
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }

    pub fn subscribe(&self) -> Shutdown {
        Shutdown {
            rx: self.tx.subscribe(),
        }
    }
}

/// Worker-side view of the shutdown signal.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn is_requested(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. A dropped trigger counts as a
    /// request so orphaned workers still stop.
    pub async fn requested(&mut self) {
        let _ = self.rx.wait_for(|requested| *requested).await;
    }

    /// Sleep for `duration`, cut short by shutdown. Returns true if
    /// shutdown fired first.
    pub async fn sleep_interrupted(&mut self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = self.requested() => true,
        }
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
