// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only JSONL audit log of upload outcomes.
//!
//! One JSON object per line in `audit.log.jsonl`, one line per upload
//! outcome (plus purge-before-upload deletions). This file is the
//! operator's ledger of what happened to every capture file; the
//! operational log in `app.log.jsonl` is for the daemon itself.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;

/// Audit event kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEvent {
    UploadAttempt,
    UploadSuccess,
    UploadFailureTransient,
    UploadFailurePermanent,
    PurgedBeforeUpload,
}

/// One line of the audit log. Nullable fields serialize as `null` so every
/// record carries the full schema.
#[derive(Debug, Clone, Serialize)]
pub struct AuditRecord {
    /// RFC 3339 timestamp.
    pub ts: String,
    pub event: AuditEvent,
    /// Basename of the file.
    pub file: String,
    pub size_bytes: u64,
    /// 1-based attempt number; 0 for purge records.
    pub attempt: u32,
    pub url: String,
    pub status_code: Option<u16>,
    pub error: Option<String>,
    pub duration_ms: Option<u64>,
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl AuditRecord {
    pub fn success(
        file: String,
        size_bytes: u64,
        attempt: u32,
        url: &url::Url,
        status_code: u16,
        duration_ms: u64,
    ) -> Self {
        Self {
            ts: now_rfc3339(),
            event: AuditEvent::UploadSuccess,
            file,
            size_bytes,
            attempt,
            url: url.to_string(),
            status_code: Some(status_code),
            error: None,
            duration_ms: Some(duration_ms),
        }
    }

    pub fn transient(
        file: String,
        size_bytes: u64,
        attempt: u32,
        url: &url::Url,
        status_code: Option<u16>,
        error: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            ts: now_rfc3339(),
            event: AuditEvent::UploadFailureTransient,
            file,
            size_bytes,
            attempt,
            url: url.to_string(),
            status_code,
            error: Some(error),
            duration_ms: Some(duration_ms),
        }
    }

    pub fn permanent(
        file: String,
        size_bytes: u64,
        attempt: u32,
        url: &url::Url,
        status_code: u16,
        error: String,
        duration_ms: u64,
    ) -> Self {
        Self {
            ts: now_rfc3339(),
            event: AuditEvent::UploadFailurePermanent,
            file,
            size_bytes,
            attempt,
            url: url.to_string(),
            status_code: Some(status_code),
            error: Some(error),
            duration_ms: Some(duration_ms),
        }
    }

    /// Deletion of a not-yet-uploaded file by the purger — the intentional
    /// release valve for unbounded retries.
    pub fn purged(file: String, size_bytes: u64, url: &url::Url) -> Self {
        Self {
            ts: now_rfc3339(),
            event: AuditEvent::PurgedBeforeUpload,
            file,
            size_bytes,
            attempt: 0,
            url: url.to_string(),
            status_code: None,
            error: None,
            duration_ms: None,
        }
    }
}

/// Appends records to the audit log.
///
/// Each append opens, writes, and closes the file; safe for the low record
/// rate. Write failures are logged via tracing and never propagate —
/// auditing must not break the pipeline.
#[derive(Debug, Clone)]
pub struct AuditLogger {
    path: PathBuf,
}

impl AuditLogger {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn record(&self, record: &AuditRecord) {
        if let Err(e) = self.append(record) {
            tracing::warn!(
                file = %record.file,
                error = %e,
                "failed to write audit record"
            );
        }
    }

    fn append(&self, record: &AuditRecord) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(record).map_err(io::Error::other)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "audit_tests.rs"]
mod tests;
