// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

/// Fallback config location when neither an argument nor the environment
/// provides one.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/bitmover/bitmover.ini";

/// Config path override: `BITMOVER_CONFIG`.
pub fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("BITMOVER_CONFIG").ok().map(PathBuf::from)
}
