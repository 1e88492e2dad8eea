// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn scanner_rescues_files_the_watcher_missed() {
    let harness = Harness::new();
    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    // The file appears while events are lost: no emit() ever happens.
    harness.write_source("missed.pcap", b"silent arrival");

    // Within scanner_check + lost_timeout the scanner rescues it and the
    // rest of the pipeline carries it through.
    wait_until(|| harness.in_stage("uploaded", "missed.pcap")).await;
    assert_eq!(harness.audit_events(), vec!["upload_success"]);

    daemon.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn watcher_outage_does_not_stall_the_pipeline() {
    let harness = Harness::new();
    let daemon = harness.start().await;
    harness.wait_for_watch().await;

    // The kernel watch dies and stays dead for the first re-subscribe.
    harness.watch.fail_next_subscribes(1);
    harness.watch.close_subscriptions();

    harness.write_source("during-outage.pcap", b"payload");

    wait_until(|| harness.in_stage("uploaded", "during-outage.pcap")).await;

    daemon.shutdown(Duration::from_secs(5)).await;
}
