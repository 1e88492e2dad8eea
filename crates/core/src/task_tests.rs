// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;

#[test]
fn retry_increments_attempt_and_sets_deadline() {
    let due = SystemTime::UNIX_EPOCH + Duration::from_secs(60);
    let task = UploadTask::new(PathBuf::from("/w/a.pcap"), 100);
    assert_eq!(task.attempt, 1);
    assert_eq!(task.not_before, None);

    let retried = task.retry(due);
    assert_eq!(retried.attempt, 2);
    assert_eq!(retried.not_before, Some(due));
    assert_eq!(retried.size, 100);
}

#[test]
fn file_name_falls_back_to_display() {
    let task = UploadTask::new(PathBuf::from("/w/capture.pcap"), 1);
    assert_eq!(task.file_name(), "capture.pcap");
}

#[test]
fn dead_letter_reason_renders_status() {
    assert_eq!(DeadLetterReason::HttpStatus(400).to_string(), "http status 400");
}
