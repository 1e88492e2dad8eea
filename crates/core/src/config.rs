// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration: INI file loading and validation.
//!
//! The config file is the operator's contract; every value is validated at
//! load and the resulting [`Config`] is immutable for the life of the
//! process. Interval keys are seconds and accept fractional values.
//! `total_disk_capacity_bytes` is in GB when non-zero (0 autodetects the
//! filesystem capacity at runtime).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::backoff::RetryPolicy;

const GIB: f64 = (1u64 << 30) as f64;

/// Errors from config loading. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid config: {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn invalid(key: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.into(),
    }
}

/// Validated daemon configuration. Constructed once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the stage directories (`source/`, `worker/`, ...).
    pub base_dir: PathBuf,
    /// Directory holding `app.log.jsonl` and `audit.log.jsonl`.
    pub logger_dir: PathBuf,
    /// Capture file extension, without the dot.
    pub pcap_extension: String,
    /// Sidecar manifest extension, without the dot.
    pub csv_extension: String,
    pub move_poll_interval: Duration,
    pub scanner_check_interval: Duration,
    pub lost_timeout: Duration,
    pub stuck_active_file_timeout: Duration,
    pub event_queue_poll_timeout: Duration,
    pub purger_poll_interval: Duration,
    /// Purge target as a fraction of capacity, strictly between 0 and 1.
    pub target_disk_usage: f64,
    /// Filesystem capacity in bytes; 0 means autodetect at runtime.
    pub total_disk_capacity_bytes: u64,
    pub uploader_poll_interval: Duration,
    pub heartbeat_interval: Duration,
    pub remote_host_url: Url,
    pub request_timeout: Duration,
    pub verify_ssl: bool,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Upload pool size.
    pub uploader_workers: usize,
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw: RawConfig = config::Config::builder()
            .add_source(config::File::new(
                &path.to_string_lossy(),
                config::FileFormat::Ini,
            ))
            .build()?
            .try_deserialize()?;
        Self::from_raw(raw)
    }

    /// Load and validate config from an INI string.
    pub fn from_ini_str(ini: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = config::Config::builder()
            .add_source(config::File::from_str(ini, config::FileFormat::Ini))
            .build()?
            .try_deserialize()?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let lost_timeout = positive_secs("lost_timeout_seconds", raw.scanner.lost_timeout_seconds)?;
        let stuck_active_file_timeout = positive_secs(
            "stuck_active_file_timeout_seconds",
            raw.scanner.stuck_active_file_timeout_seconds,
        )?;
        if stuck_active_file_timeout <= lost_timeout {
            return Err(invalid(
                "stuck_active_file_timeout_seconds",
                "must exceed lost_timeout_seconds",
            ));
        }

        let target = raw.purger.target_disk_usage_percent;
        if !(target.is_finite() && target > 0.0 && target < 1.0) {
            return Err(invalid(
                "target_disk_usage_percent",
                format!("must be strictly between 0 and 1, got {target}"),
            ));
        }

        let capacity_gb = raw.purger.total_disk_capacity_bytes;
        if !(capacity_gb.is_finite() && capacity_gb >= 0.0) {
            return Err(invalid(
                "total_disk_capacity_bytes",
                format!("must be a non-negative number of GB, got {capacity_gb}"),
            ));
        }

        let initial_backoff = positive_secs("initial_backoff", raw.uploader.initial_backoff)?;
        let max_backoff = positive_secs("max_backoff", raw.uploader.max_backoff)?;
        if initial_backoff > max_backoff {
            return Err(invalid("initial_backoff", "must not exceed max_backoff"));
        }

        let remote_host_url = Url::parse(&raw.uploader.remote_host_url)
            .map_err(|e| invalid("remote_host_url", e.to_string()))?;
        if !matches!(remote_host_url.scheme(), "http" | "https") {
            return Err(invalid(
                "remote_host_url",
                format!("unsupported scheme {:?}", remote_host_url.scheme()),
            ));
        }

        if raw.uploader.uploader_workers == 0 {
            return Err(invalid("uploader_workers", "must be at least 1"));
        }

        Ok(Self {
            base_dir: PathBuf::from(raw.directories.base_dir),
            logger_dir: PathBuf::from(raw.directories.logger_dir),
            pcap_extension: extension("pcap_extension_no_dot", raw.files.pcap_extension_no_dot)?,
            csv_extension: extension("csv_extension_no_dot", raw.files.csv_extension_no_dot)?,
            move_poll_interval: positive_secs(
                "move_poll_interval_seconds",
                raw.mover.move_poll_interval_seconds,
            )?,
            scanner_check_interval: positive_secs(
                "scanner_check_seconds",
                raw.scanner.scanner_check_seconds,
            )?,
            lost_timeout,
            stuck_active_file_timeout,
            event_queue_poll_timeout: positive_secs(
                "event_queue_poll_timeout_seconds",
                raw.tailer.event_queue_poll_timeout_seconds,
            )?,
            purger_poll_interval: positive_secs(
                "purger_poll_interval_seconds",
                raw.purger.purger_poll_interval_seconds,
            )?,
            target_disk_usage: target,
            total_disk_capacity_bytes: (capacity_gb * GIB) as u64,
            uploader_poll_interval: positive_secs(
                "uploader_poll_interval_seconds",
                raw.uploader.uploader_poll_interval_seconds,
            )?,
            heartbeat_interval: positive_secs(
                "heartbeat_target_interval_s",
                raw.uploader.heartbeat_target_interval_s,
            )?,
            remote_host_url,
            request_timeout: positive_secs("request_timeout", raw.uploader.request_timeout)?,
            verify_ssl: raw.uploader.verify_ssl,
            initial_backoff,
            max_backoff,
            uploader_workers: raw.uploader.uploader_workers as usize,
        })
    }

    pub fn source_dir(&self) -> PathBuf {
        self.base_dir.join("source")
    }

    pub fn worker_dir(&self) -> PathBuf {
        self.base_dir.join("worker")
    }

    pub fn uploaded_dir(&self) -> PathBuf {
        self.base_dir.join("uploaded")
    }

    pub fn dead_letter_dir(&self) -> PathBuf {
        self.base_dir.join("dead_letter")
    }

    pub fn csv_dir(&self) -> PathBuf {
        self.base_dir.join("csv")
    }

    pub fn app_log_path(&self) -> PathBuf {
        self.logger_dir.join("app.log.jsonl")
    }

    pub fn audit_log_path(&self) -> PathBuf {
        self.logger_dir.join("audit.log.jsonl")
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.initial_backoff, self.max_backoff)
    }
}

fn positive_secs(key: &'static str, value: f64) -> Result<Duration, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(Duration::from_secs_f64(value))
    } else {
        Err(invalid(
            key,
            format!("must be a positive number of seconds, got {value}"),
        ))
    }
}

fn extension(key: &'static str, value: String) -> Result<String, ConfigError> {
    if value.is_empty() {
        return Err(invalid(key, "must not be empty"));
    }
    if value.contains('.') {
        return Err(invalid(key, "must not contain a dot"));
    }
    Ok(value)
}

// Raw INI shape. Section names accept both the canonical capitalized form
// and lowercase, since INI readers differ on case folding.

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(alias = "Directories")]
    directories: RawDirectories,
    #[serde(alias = "Files")]
    files: RawFiles,
    #[serde(alias = "Mover")]
    mover: RawMover,
    #[serde(alias = "Scanner")]
    scanner: RawScanner,
    #[serde(alias = "Tailer", default)]
    tailer: RawTailer,
    #[serde(alias = "Purger")]
    purger: RawPurger,
    #[serde(alias = "Uploader")]
    uploader: RawUploader,
}

#[derive(Debug, Deserialize)]
struct RawDirectories {
    base_dir: String,
    logger_dir: String,
}

#[derive(Debug, Deserialize)]
struct RawFiles {
    pcap_extension_no_dot: String,
    csv_extension_no_dot: String,
}

#[derive(Debug, Deserialize)]
struct RawMover {
    move_poll_interval_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct RawScanner {
    scanner_check_seconds: f64,
    lost_timeout_seconds: f64,
    stuck_active_file_timeout_seconds: f64,
}

#[derive(Debug, Deserialize)]
struct RawTailer {
    #[serde(default = "default_event_queue_poll_timeout")]
    event_queue_poll_timeout_seconds: f64,
}

impl Default for RawTailer {
    fn default() -> Self {
        Self {
            event_queue_poll_timeout_seconds: default_event_queue_poll_timeout(),
        }
    }
}

fn default_event_queue_poll_timeout() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
struct RawPurger {
    purger_poll_interval_seconds: f64,
    target_disk_usage_percent: f64,
    total_disk_capacity_bytes: f64,
}

#[derive(Debug, Deserialize)]
struct RawUploader {
    uploader_poll_interval_seconds: f64,
    heartbeat_target_interval_s: f64,
    remote_host_url: String,
    request_timeout: f64,
    verify_ssl: bool,
    initial_backoff: f64,
    max_backoff: f64,
    #[serde(default = "default_uploader_workers")]
    uploader_workers: u32,
}

fn default_uploader_workers() -> u32 {
    1
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
