// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File metadata snapshots surfaced by the filesystem seam.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Kind of directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular,
    Directory,
    Other,
}

/// Immutable snapshot of one file's metadata.
///
/// Snapshots are taken by the scanner or watcher, carried through one
/// pipeline decision, and discarded. They are never refreshed in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub mtime: SystemTime,
    pub size: u64,
    pub kind: FileKind,
}

impl FileEntry {
    pub fn is_regular(&self) -> bool {
        self.kind == FileKind::Regular
    }

    /// Basename as UTF-8, if the path has one.
    pub fn file_name(&self) -> Option<&str> {
        self.path.file_name().and_then(|n| n.to_str())
    }

    /// Time elapsed since the file was last modified. Saturates to zero for
    /// mtimes in the future (clock skew on the producer side).
    pub fn age(&self, now: SystemTime) -> Duration {
        now.duration_since(self.mtime).unwrap_or(Duration::ZERO)
    }
}

/// True if `path` ends in `.{ext_no_dot}`.
pub fn has_extension(path: &Path, ext_no_dot: &str) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ext_no_dot)
}

#[cfg(test)]
#[path = "entry_tests.rs"]
mod tests;
