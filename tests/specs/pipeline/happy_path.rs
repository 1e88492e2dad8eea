// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn watched_file_is_uploaded_and_archived() {
    let harness = Harness::new();
    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    let payload = vec![0xABu8; 100];
    let path = harness.write_source("a.pcap", &payload);
    harness.watch.emit(path);

    wait_until(|| harness.in_stage("uploaded", "a.pcap")).await;
    assert!(!harness.in_stage("source", "a.pcap"));
    assert!(!harness.in_stage("worker", "a.pcap"));
    assert!(!harness.in_stage("dead_letter", "a.pcap"));

    // The remote saw exactly one POST with the right name and bytes.
    let calls = harness.http.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].filename, "a.pcap");
    assert_eq!(calls[0].size, 100);
    assert_eq!(calls[0].body, payload);
    assert_eq!(
        calls[0].url,
        "https://ingest.example.com/pcap"
    );

    // One audit record with the full schema.
    let records = harness.audit_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["event"], "upload_success");
    assert_eq!(records[0]["file"], "a.pcap");
    assert_eq!(records[0]["size_bytes"], 100);
    assert_eq!(records[0]["attempt"], 1);
    assert_eq!(records[0]["status_code"], 200);

    // Archived content is byte-identical: the pipeline never rewrites.
    let archived = std::fs::read(harness.stage_path("uploaded", "a.pcap")).unwrap();
    assert_eq!(archived, payload);

    daemon.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn sidecar_csv_files_are_ignored_by_the_pipeline() {
    let harness = Harness::new();
    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    let manifest = harness.write_source("a.csv", b"name,size\na.pcap,100\n");
    let capture = harness.write_source("a.pcap", b"data");
    harness.watch.emit(manifest);
    harness.watch.emit(capture);

    wait_until(|| harness.in_stage("uploaded", "a.pcap")).await;
    // The manifest never left source/.
    assert!(harness.in_stage("source", "a.csv"));
    assert_eq!(harness.http.call_count(), 1);

    daemon.shutdown(Duration::from_secs(5)).await;
}
