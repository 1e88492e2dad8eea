// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use bitmover_adapters::FakeResponse;
use std::time::Duration;

#[tokio::test]
async fn shutdown_mid_upload_leaves_file_for_next_run() {
    let harness = Harness::new();
    // The first upload attempt hangs far past the drain deadline.
    harness
        .http
        .push(FakeResponse::Stall(Duration::from_secs(30), 200));

    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    let path = harness.write_source("inflight.pcap", b"half sent");
    harness.watch.emit(path);

    // The upload is in flight when the termination signal arrives.
    wait_until(|| harness.http.call_count() == 1).await;
    daemon.shutdown(Duration::from_millis(300)).await;

    // Abandoned, not lost: still staged in worker/.
    assert!(harness.in_stage("worker", "inflight.pcap"));
    assert!(!harness.in_stage("uploaded", "inflight.pcap"));
    assert!(harness.audit_events().is_empty());

    // Next run recovers it without any new discovery event.
    let daemon = harness.start().await;
    wait_until(|| harness.in_stage("uploaded", "inflight.pcap")).await;
    assert_eq!(harness.audit_events(), vec!["upload_success"]);

    daemon.shutdown(Duration::from_secs(5)).await;
}
