// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::shutdown::shutdown_channel;
use bitmover_adapters::FakeWatchAdapter;
use bitmover_core::FakeClock;

fn config() -> WatcherConfig {
    WatcherConfig {
        source_dir: PathBuf::from("/base/source"),
        pcap_extension: "pcap".to_string(),
        poll_timeout: Duration::from_secs(1),
    }
}

async fn wait_for<F: Fn() -> bool>(condition: F) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(10);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test(start_paused = true)]
async fn queues_matching_files_only() {
    let watch = FakeWatchAdapter::new();
    let queue = MoveQueue::new(16);
    let (trigger, shutdown) = shutdown_channel();
    let handle = Watcher::new(
        config(),
        watch.clone(),
        FakeClock::new(),
        queue.clone(),
        shutdown,
    )
    .spawn();

    wait_for(|| watch.subscription_count() == 1).await;
    watch.emit("/base/source/a.pcap");
    watch.emit("/base/source/manifest.csv");
    watch.emit("/base/source/b.pcap");

    wait_for(|| queue.len() == 2).await;
    assert_eq!(queue.recv().await.path, PathBuf::from("/base/source/a.pcap"));
    assert_eq!(queue.recv().await.path, PathBuf::from("/base/source/b.pcap"));

    trigger.trigger();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn tasks_carry_watcher_origin_and_time() {
    let watch = FakeWatchAdapter::new();
    let queue = MoveQueue::new(16);
    let clock = FakeClock::new();
    let (trigger, shutdown) = shutdown_channel();
    let handle = Watcher::new(config(), watch.clone(), clock.clone(), queue.clone(), shutdown)
        .spawn();

    wait_for(|| watch.subscription_count() == 1).await;
    watch.emit("/base/source/a.pcap");

    wait_for(|| queue.len() == 1).await;
    let task = queue.recv().await;
    assert_eq!(task.origin, DiscoveryOrigin::Watcher);
    assert_eq!(task.discovered_at, clock.now());

    trigger.trigger();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn resubscribes_when_stream_dies() {
    let watch = FakeWatchAdapter::new();
    let queue = MoveQueue::new(16);
    let (trigger, shutdown) = shutdown_channel();
    let handle = Watcher::new(
        config(),
        watch.clone(),
        FakeClock::new(),
        queue.clone(),
        shutdown,
    )
    .spawn();

    wait_for(|| watch.subscription_count() == 1).await;
    watch.close_subscriptions();

    wait_for(|| watch.subscription_count() == 2).await;
    watch.emit("/base/source/late.pcap");
    wait_for(|| queue.len() == 1).await;

    trigger.trigger();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn survives_repeated_subscribe_failures() {
    let watch = FakeWatchAdapter::new();
    watch.fail_next_subscribes(3);
    let queue = MoveQueue::new(16);
    let (trigger, shutdown) = shutdown_channel();
    let handle = Watcher::new(
        config(),
        watch.clone(),
        FakeClock::new(),
        queue.clone(),
        shutdown,
    )
    .spawn();

    wait_for(|| watch.subscription_count() == 1).await;
    watch.emit("/base/source/a.pcap");
    wait_for(|| queue.len() == 1).await;

    trigger.trigger();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn stream_error_triggers_resubscribe() {
    let watch = FakeWatchAdapter::new();
    let queue = MoveQueue::new(16);
    let (trigger, shutdown) = shutdown_channel();
    let handle = Watcher::new(
        config(),
        watch.clone(),
        FakeClock::new(),
        queue.clone(),
        shutdown,
    )
    .spawn();

    wait_for(|| watch.subscription_count() == 1).await;
    watch.emit_error("queue overflowed");

    wait_for(|| watch.subscription_count() == 2).await;

    trigger.trigger();
    handle.await.unwrap();
}
