// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real filesystem adapter backed by `tokio::fs`.

use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use bitmover_core::{FileEntry, FileKind};

use super::{DiskUsage, FileReader, FsAdapter, FsError};
use async_trait::async_trait;

/// The one component that touches the OS filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFsAdapter;

impl TokioFsAdapter {
    pub fn new() -> Self {
        Self
    }
}

fn entry_from_metadata(path: PathBuf, metadata: &std::fs::Metadata) -> FileEntry {
    let kind = if metadata.is_file() {
        FileKind::Regular
    } else if metadata.is_dir() {
        FileKind::Directory
    } else {
        FileKind::Other
    };
    FileEntry {
        mtime: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        size: metadata.len(),
        kind,
        path,
    }
}

#[async_trait]
impl FsAdapter for TokioFsAdapter {
    async fn scan_dir(&self, dir: &Path) -> Result<Vec<FileEntry>, FsError> {
        let mut read_dir = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| FsError::from_io(dir, e))?;
        let mut entries = Vec::new();
        while let Some(dirent) = read_dir
            .next_entry()
            .await
            .map_err(|e| FsError::from_io(dir, e))?
        {
            let path = dirent.path();
            match dirent.metadata().await {
                Ok(metadata) => entries.push(entry_from_metadata(path, &metadata)),
                // Entry unlinked between listing and stat: skip it.
                Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
                Err(e) => return Err(FsError::from_io(&path, e)),
            }
        }
        Ok(entries)
    }

    async fn lstat(&self, path: &Path) -> Result<FileEntry, FsError> {
        let metadata = tokio::fs::symlink_metadata(path)
            .await
            .map_err(|e| FsError::from_io(path, e))?;
        Ok(entry_from_metadata(path.to_path_buf(), &metadata))
    }

    async fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        tokio::fs::rename(src, dst).await.map_err(|e| {
            if e.kind() == io::ErrorKind::CrossesDevices {
                FsError::CrossDevice {
                    src: src.to_path_buf(),
                    dst: dst.to_path_buf(),
                }
            } else {
                FsError::from_io(src, e)
            }
        })
    }

    async fn unlink(&self, path: &Path) -> Result<(), FsError> {
        tokio::fs::remove_file(path)
            .await
            .map_err(|e| FsError::from_io(path, e))
    }

    async fn open_read(&self, path: &Path) -> Result<FileReader, FsError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| FsError::from_io(path, e))?;
        Ok(Box::pin(file))
    }

    async fn disk_usage(&self, path: &Path) -> Result<DiskUsage, FsError> {
        let owned = path.to_path_buf();
        let stats = tokio::task::spawn_blocking(move || {
            let total = fs2::total_space(&owned)?;
            let available = fs2::available_space(&owned)?;
            Ok::<_, io::Error>((total, available))
        })
        .await
        .map_err(|e| FsError::Io {
            path: path.to_path_buf(),
            source: io::Error::other(e),
        })?
        .map_err(|e| FsError::from_io(path, e))?;

        let (total_bytes, available) = stats;
        Ok(DiskUsage {
            used_bytes: total_bytes.saturating_sub(available),
            total_bytes,
        })
    }

    async fn mkdir_p(&self, path: &Path) -> Result<(), FsError> {
        tokio::fs::create_dir_all(path)
            .await
            .map_err(|e| FsError::from_io(path, e))
    }

    async fn exists(&self, path: &Path) -> Result<bool, FsError> {
        tokio::fs::try_exists(path)
            .await
            .map_err(|e| FsError::from_io(path, e))
    }

    async fn device_id(&self, path: &Path) -> Result<u64, FsError> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FsError::from_io(path, e))?;
        Ok(metadata.dev())
    }
}

#[cfg(test)]
#[path = "real_tests.rs"]
mod tests;
