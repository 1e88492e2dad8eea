// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kernel-event watcher backed by `notify`.

use std::path::Path;

use async_trait::async_trait;
use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::{WatchAdapter, WatchError, WatchStream};

const EVENT_BUFFER: usize = 256;

/// Real directory watcher using the platform's recommended backend.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsEventWatchAdapter;

impl FsEventWatchAdapter {
    pub fn new() -> Self {
        Self
    }
}

/// Events that mean a file arrived in the directory. Writes and rename-out
/// are ignored; the mover validates candidates with `lstat` anyway.
fn is_arrival(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Name(
                RenameMode::To | RenameMode::Both | RenameMode::Any
            ))
    )
}

#[async_trait]
impl WatchAdapter for FsEventWatchAdapter {
    async fn subscribe(&self, dir: &Path) -> Result<WatchStream, WatchError> {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let mut watcher =
            notify::recommended_watcher(move |res: Result<notify::Event, notify::Error>| {
                // The callback runs on notify's own thread, so blocking_send
                // is allowed; a full buffer briefly stalls that thread.
                match res {
                    Ok(event) if is_arrival(&event.kind) => {
                        for path in event.paths {
                            let _ = tx.blocking_send(Ok(path));
                        }
                    }
                    Ok(_) => {}
                    Err(e) => {
                        let _ = tx.blocking_send(Err(WatchError::Stream(e.to_string())));
                    }
                }
            })
            .map_err(|e| WatchError::Subscribe {
                dir: dir.to_path_buf(),
                message: e.to_string(),
            })?;

        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::Subscribe {
                dir: dir.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(WatchStream::new(rx, Some(Box::new(watcher))))
    }
}

#[cfg(test)]
#[path = "fs_events_tests.rs"]
mod tests;
