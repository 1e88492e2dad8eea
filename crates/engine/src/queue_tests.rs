// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use bitmover_core::DiscoveryOrigin;
use std::time::SystemTime;

fn task(path: &str) -> MoveTask {
    MoveTask::new(
        PathBuf::from(path),
        SystemTime::UNIX_EPOCH,
        DiscoveryOrigin::Watcher,
    )
}

#[test]
fn fifo_order_with_dedupe() {
    let queue = MoveQueue::new(8);

    assert_eq!(queue.submit(task("/s/a.pcap")), Submit::Enqueued);
    assert_eq!(queue.submit(task("/s/b.pcap")), Submit::Enqueued);
    assert_eq!(queue.submit(task("/s/a.pcap")), Submit::Duplicate);
    assert_eq!(queue.len(), 2);
}

#[tokio::test]
async fn recv_returns_oldest_first() {
    let queue = MoveQueue::new(8);
    queue.submit(task("/s/a.pcap"));
    queue.submit(task("/s/b.pcap"));

    assert_eq!(queue.recv().await.path, PathBuf::from("/s/a.pcap"));
    assert_eq!(queue.recv().await.path, PathBuf::from("/s/b.pcap"));
    assert!(queue.is_empty());
}

#[test]
fn overflow_sheds_oldest_entry() {
    let queue = MoveQueue::new(2);
    queue.submit(task("/s/a.pcap"));
    queue.submit(task("/s/b.pcap"));

    let outcome = queue.submit(task("/s/c.pcap"));
    assert_eq!(outcome, Submit::DroppedOldest(PathBuf::from("/s/a.pcap")));
    assert_eq!(queue.len(), 2);
}

#[test]
fn shed_path_can_be_resubmitted() {
    let queue = MoveQueue::new(2);
    queue.submit(task("/s/a.pcap"));
    queue.submit(task("/s/b.pcap"));
    queue.submit(task("/s/c.pcap"));

    // The scanner re-finds /s/a.pcap on its next tick.
    assert_eq!(queue.submit(task("/s/a.pcap")), Submit::DroppedOldest(PathBuf::from("/s/b.pcap")));
}

#[tokio::test]
async fn consumed_path_is_no_longer_a_duplicate() {
    let queue = MoveQueue::new(8);
    queue.submit(task("/s/a.pcap"));
    let _ = queue.recv().await;

    assert_eq!(queue.submit(task("/s/a.pcap")), Submit::Enqueued);
}

#[tokio::test(start_paused = true)]
async fn recv_wakes_on_submit() {
    let queue = MoveQueue::new(8);
    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.recv().await })
    };
    tokio::task::yield_now().await;

    queue.submit(task("/s/late.pcap"));
    assert_eq!(waiter.await.unwrap().path, PathBuf::from("/s/late.pcap"));
}
