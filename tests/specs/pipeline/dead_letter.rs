// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn permanent_rejection_dead_letters_the_file() {
    let harness = Harness::new();
    harness.http.push_status(400);

    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    let path = harness.write_source("bad.pcap", b"corrupt capture");
    harness.watch.emit(path);

    wait_until(|| harness.in_stage("dead_letter", "bad.pcap")).await;
    assert!(!harness.in_stage("worker", "bad.pcap"));
    assert!(!harness.in_stage("uploaded", "bad.pcap"));
    assert_eq!(harness.http.call_count(), 1);

    let records = harness.audit_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["event"], "upload_failure_permanent");
    assert_eq!(records[0]["status_code"], 400);
    assert_eq!(records[0]["attempt"], 1);

    // Dead-lettered evidence is preserved byte-for-byte.
    let preserved = std::fs::read(harness.stage_path("dead_letter", "bad.pcap")).unwrap();
    assert_eq!(preserved, b"corrupt capture");

    daemon.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn not_found_is_permanent_while_timeout_is_not() {
    let harness = Harness::new();
    harness.http.push(bitmover_adapters::FakeResponse::Timeout);
    harness.http.push_status(404);

    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    let path = harness.write_source("gone.pcap", b"payload");
    harness.watch.emit(path);

    wait_until(|| harness.in_stage("dead_letter", "gone.pcap")).await;
    assert_eq!(
        harness.audit_events(),
        vec!["upload_failure_transient", "upload_failure_permanent"]
    );

    daemon.shutdown(Duration::from_secs(5)).await;
}
