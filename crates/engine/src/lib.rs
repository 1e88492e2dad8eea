// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Bitmover pipeline engine
//!
//! The workers that move files through the stage directories: watcher and
//! scanner discover candidates in `source/`, the mover renames them into
//! `worker/`, the uploader pool drives each file to a terminal outcome in
//! `uploaded/` or `dead_letter/`, and the purger keeps the staging
//! filesystem under its disk budget.

pub mod audit;
mod error;
pub mod mover;
pub mod purger;
pub mod queue;
pub mod scanner;
pub mod shutdown;
pub mod uploader;
pub mod watcher;

pub use audit::{AuditEvent, AuditLogger, AuditRecord};
pub use error::FatalError;
pub use mover::{Mover, MoverConfig};
pub use purger::{Purger, PurgerConfig};
pub use queue::{
    upload_channel, MoveQueue, Submit, UploadReceiver, UploadSender, DEFAULT_QUEUE_CAPACITY,
};
pub use scanner::{Scanner, ScannerConfig};
pub use shutdown::{shutdown_channel, Shutdown, ShutdownTrigger};
pub use uploader::{UploaderConfig, UploaderPool};
pub use watcher::{Watcher, WatcherConfig};
