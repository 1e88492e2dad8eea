// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for pipeline specs.

use std::path::PathBuf;
use std::time::Duration;

use bitmover_adapters::{FakeHttpAdapter, FakeWatchAdapter, TokioFsAdapter};
use bitmover_core::{Config, SystemClock};
use bitmover_daemon::lifecycle::{self, Daemon};

/// One daemon-under-test over real temp directories. Only the watch and
/// HTTP seams are faked.
pub struct Harness {
    pub config: Config,
    pub http: FakeHttpAdapter,
    pub watch: FakeWatchAdapter,
    _dir: tempfile::TempDir,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_overrides(&[])
    }

    /// Build a harness, overriding `key = value` lines of the default
    /// config.
    pub fn with_overrides(overrides: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("data");
        let logs = dir.path().join("logs");

        let mut ini = format!(
            r#"
[Directories]
base_dir = {}
logger_dir = {}

[Files]
pcap_extension_no_dot = pcap
csv_extension_no_dot = csv

[Mover]
move_poll_interval_seconds = 0.05

[Scanner]
scanner_check_seconds = 0.05
lost_timeout_seconds = 0.3
stuck_active_file_timeout_seconds = 5

[Tailer]
event_queue_poll_timeout_seconds = 0.5

[Purger]
purger_poll_interval_seconds = 0.1
target_disk_usage_percent = 0.8
total_disk_capacity_bytes = 1

[Uploader]
uploader_poll_interval_seconds = 0.05
heartbeat_target_interval_s = 60
remote_host_url = https://ingest.example.com/pcap
request_timeout = 5
verify_ssl = true
initial_backoff = 0.05
max_backoff = 0.4
"#,
            base.display(),
            logs.display(),
        );
        for (key, value) in overrides {
            ini = ini
                .lines()
                .map(|line| {
                    if line.starts_with(key) {
                        format!("{key} = {value}")
                    } else {
                        line.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
        }

        let config = Config::from_ini_str(&ini).unwrap();
        Self {
            config,
            http: FakeHttpAdapter::new(),
            watch: FakeWatchAdapter::new(),
            _dir: dir,
        }
    }

    pub async fn start(&self) -> Daemon {
        lifecycle::startup_with(
            &self.config,
            TokioFsAdapter::new(),
            self.http.clone(),
            self.watch.clone(),
            SystemClock,
        )
        .await
        .unwrap()
    }

    /// Wait until the watcher's subscription is live so emitted events are
    /// not lost.
    pub async fn wait_for_watch(&self) {
        wait_until(|| self.watch.subscription_count() > 0).await;
    }

    pub fn stage_path(&self, stage: &str, name: &str) -> PathBuf {
        self.config.base_dir.join(stage).join(name)
    }

    pub fn in_stage(&self, stage: &str, name: &str) -> bool {
        self.stage_path(stage, name).exists()
    }

    /// Write a file into `source/`, creating the directory when the spec
    /// runs before startup.
    pub fn write_source(&self, name: &str, contents: &[u8]) -> PathBuf {
        let dir = self.config.base_dir.join("source");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    pub fn audit_records(&self) -> Vec<serde_json::Value> {
        match std::fs::read_to_string(self.config.audit_log_path()) {
            Ok(contents) => contents
                .lines()
                .map(|line| serde_json::from_str(line).unwrap())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub fn audit_events(&self) -> Vec<String> {
        self.audit_records()
            .iter()
            .map(|record| record["event"].as_str().unwrap().to_string())
            .collect()
    }
}

/// Poll a condition with a generous real-time deadline.
pub async fn wait_until<F: Fn() -> bool>(condition: F) {
    let deadline = std::time::Instant::now() + Duration::from_secs(15);
    while !condition() {
        assert!(
            std::time::Instant::now() < deadline,
            "condition not met within 15s"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
