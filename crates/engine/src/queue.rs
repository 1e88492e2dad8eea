// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded in-memory queues between pipeline stages.
//!
//! The move queue deduplicates by path and sheds its oldest entry on
//! overflow — discovery is repeatable, so a shed entry is re-found by the
//! scanner on a later tick. The upload queue is a plain bounded channel;
//! a full queue blocks the mover and backpressure reaches `source/`.

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use bitmover_core::{MoveTask, UploadTask};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};

/// Default capacity for both stage queues.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub type UploadSender = mpsc::Sender<UploadTask>;
pub type UploadReceiver = mpsc::Receiver<UploadTask>;

/// Bounded channel between mover and uploader pool.
pub fn upload_channel(capacity: usize) -> (UploadSender, UploadReceiver) {
    mpsc::channel(capacity)
}

/// Outcome of a move-queue submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submit {
    Enqueued,
    /// The path is already queued; the new submission was dropped.
    Duplicate,
    /// Capacity was reached; the oldest entry was shed to make room.
    DroppedOldest(PathBuf),
}

struct MoveQueueState {
    tasks: VecDeque<MoveTask>,
    queued: HashSet<PathBuf>,
}

struct MoveQueueInner {
    state: Mutex<MoveQueueState>,
    notify: Notify,
    capacity: usize,
}

/// Bounded, path-deduplicating queue between discovery and the mover.
///
/// Producers never block: on overflow the oldest entry is dropped before
/// the new submission is accepted.
#[derive(Clone)]
pub struct MoveQueue {
    inner: Arc<MoveQueueInner>,
}

impl MoveQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(MoveQueueInner {
                state: Mutex::new(MoveQueueState {
                    tasks: VecDeque::new(),
                    queued: HashSet::new(),
                }),
                notify: Notify::new(),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Submit a task, deduplicating by path.
    pub fn submit(&self, task: MoveTask) -> Submit {
        let outcome = {
            let mut state = self.inner.state.lock();
            if !state.queued.insert(task.path.clone()) {
                return Submit::Duplicate;
            }
            let outcome = if state.tasks.len() >= self.inner.capacity {
                match state.tasks.pop_front() {
                    Some(oldest) => {
                        state.queued.remove(&oldest.path);
                        Submit::DroppedOldest(oldest.path)
                    }
                    None => Submit::Enqueued,
                }
            } else {
                Submit::Enqueued
            };
            state.tasks.push_back(task);
            outcome
        };
        self.inner.notify.notify_one();
        outcome
    }

    /// Wait for the next task. Single consumer.
    pub async fn recv(&self) -> MoveTask {
        loop {
            if let Some(task) = self.pop() {
                return task;
            }
            self.inner.notify.notified().await;
        }
    }

    fn pop(&self) -> Option<MoveTask> {
        let mut state = self.inner.state.lock();
        let task = state.tasks.pop_front()?;
        state.queued.remove(&task.path);
        Some(task)
    }

    pub fn len(&self) -> usize {
        self.inner.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
