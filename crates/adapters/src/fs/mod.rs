// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Filesystem seam.
//!
//! The only code allowed to touch the OS filesystem is [`TokioFsAdapter`];
//! everything above works through [`FsAdapter`] so tests can substitute the
//! in-memory fake.

mod real;

pub use real::TokioFsAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeFsAdapter;

use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use async_trait::async_trait;
use bitmover_core::FileEntry;
use thiserror::Error;
use tokio::io::AsyncRead;

/// Byte source for streaming a file without buffering it whole.
pub type FileReader = Pin<Box<dyn AsyncRead + Send>>;

/// Capacity snapshot of the filesystem containing a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskUsage {
    pub used_bytes: u64,
    pub total_bytes: u64,
}

/// Errors from filesystem operations, classified at the seam.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("not found: {0}")]
    NotFound(PathBuf),
    #[error("permission denied: {0}")]
    Permission(PathBuf),
    #[error("cross-device rename: {src} -> {dst}")]
    CrossDevice { src: PathBuf, dst: PathBuf },
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Classify an `io::Error` for an operation on `path`.
    pub fn from_io(path: &Path, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => FsError::Permission(path.to_path_buf()),
            _ => FsError::Io {
                path: path.to_path_buf(),
                source,
            },
        }
    }

    /// A vanished file is benign almost everywhere in the pipeline.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::NotFound(_))
    }
}

/// Capability set over the staging filesystem.
#[async_trait]
pub trait FsAdapter: Clone + Send + Sync + 'static {
    /// List the direct children of `dir` as metadata snapshots.
    async fn scan_dir(&self, dir: &Path) -> Result<Vec<FileEntry>, FsError>;

    /// Metadata snapshot of one path, without following symlinks.
    async fn lstat(&self, path: &Path) -> Result<FileEntry, FsError>;

    /// Atomic same-filesystem rename; the pipeline's serialization point.
    async fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError>;

    async fn unlink(&self, path: &Path) -> Result<(), FsError>;

    async fn open_read(&self, path: &Path) -> Result<FileReader, FsError>;

    /// Used/total bytes of the filesystem containing `path`.
    async fn disk_usage(&self, path: &Path) -> Result<DiskUsage, FsError>;

    async fn mkdir_p(&self, path: &Path) -> Result<(), FsError>;

    async fn exists(&self, path: &Path) -> Result<bool, FsError>;

    /// Device id of the filesystem containing `path`, for the
    /// same-filesystem startup check.
    async fn device_id(&self, path: &Path) -> Result<u64, FsError>;
}
