// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use std::time::{Duration, Instant};

#[tokio::test]
async fn transient_errors_back_off_then_succeed() {
    let harness = Harness::new();
    harness.http.push_status(503);
    harness.http.push_status(503);
    harness.http.push_status(200);

    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    let started = Instant::now();
    let path = harness.write_source("retry.pcap", b"payload");
    harness.watch.emit(path);

    wait_until(|| harness.in_stage("uploaded", "retry.pcap")).await;

    // Three attempts, audited in order with growing attempt numbers.
    assert_eq!(harness.http.call_count(), 3);
    assert_eq!(
        harness.audit_events(),
        vec![
            "upload_failure_transient",
            "upload_failure_transient",
            "upload_success",
        ]
    );
    let attempts: Vec<u64> = harness
        .audit_records()
        .iter()
        .map(|record| record["attempt"].as_u64().unwrap())
        .collect();
    assert_eq!(attempts, vec![1, 2, 3]);

    // Backoff floors: first retry waits at least initial_backoff (50ms),
    // the second at least double that.
    assert!(
        started.elapsed() >= Duration::from_millis(150),
        "retries completed too fast: {:?}",
        started.elapsed()
    );

    daemon.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn connection_errors_are_retried() {
    let harness = Harness::new();
    harness
        .http
        .push(bitmover_adapters::FakeResponse::ConnectError);
    harness.http.push_status(200);

    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    let path = harness.write_source("conn.pcap", b"payload");
    harness.watch.emit(path);

    wait_until(|| harness.in_stage("uploaded", "conn.pcap")).await;
    assert_eq!(harness.http.call_count(), 2);

    let records = harness.audit_records();
    assert_eq!(records[0]["event"], "upload_failure_transient");
    assert!(records[0]["status_code"].is_null());
    assert!(records[0]["error"]
        .as_str()
        .unwrap()
        .contains("connection"));

    daemon.shutdown(Duration::from_secs(5)).await;
}
