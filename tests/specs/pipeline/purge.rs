// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::prelude::*;
use std::time::Duration;

#[tokio::test]
async fn purger_deletes_oldest_uploaded_files_to_meet_target() {
    // Capacity 0.00001 GB (~10.7 KB), target 0.5. Ten 1 KiB files put
    // usage at ~95%; five must go, oldest first.
    let harness = Harness::with_overrides(&[
        ("total_disk_capacity_bytes", "0.00001"),
        ("target_disk_usage_percent", "0.5"),
    ]);

    let uploaded = harness.config.base_dir.join("uploaded");
    let dead_letter = harness.config.base_dir.join("dead_letter");
    std::fs::create_dir_all(&uploaded).unwrap();
    std::fs::create_dir_all(&dead_letter).unwrap();
    for i in 0..10 {
        std::fs::write(uploaded.join(format!("f{i}.pcap")), vec![0u8; 1024]).unwrap();
        // Distinct mtimes so "oldest" is well-defined.
        std::thread::sleep(Duration::from_millis(5));
    }
    std::fs::write(dead_letter.join("evidence.pcap"), vec![0u8; 10]).unwrap();

    let daemon = harness.start().await;

    wait_until(|| (0..5).all(|i| !harness.in_stage("uploaded", &format!("f{i}.pcap")))).await;

    // The five newest survive; protected evidence is untouched.
    for i in 5..10 {
        assert!(
            harness.in_stage("uploaded", &format!("f{i}.pcap")),
            "f{i}.pcap should have survived"
        );
    }
    assert!(harness.in_stage("dead_letter", "evidence.pcap"));

    // Uploaded-file deletions are not audited; only worker/ purges are.
    assert!(harness.audit_events().is_empty());

    daemon.shutdown(Duration::from_secs(5)).await;
}

#[tokio::test]
async fn under_target_nothing_is_deleted() {
    let harness = Harness::with_overrides(&[
        ("total_disk_capacity_bytes", "0.00001"),
        ("target_disk_usage_percent", "0.9"),
    ]);

    let uploaded = harness.config.base_dir.join("uploaded");
    std::fs::create_dir_all(&uploaded).unwrap();
    for i in 0..3 {
        std::fs::write(uploaded.join(format!("f{i}.pcap")), vec![0u8; 1024]).unwrap();
    }

    let daemon = harness.start().await;
    // Let several purger ticks pass.
    tokio::time::sleep(Duration::from_millis(500)).await;

    for i in 0..3 {
        assert!(harness.in_stage("uploaded", &format!("f{i}.pcap")));
    }

    daemon.shutdown(Duration::from_secs(5)).await;
}
