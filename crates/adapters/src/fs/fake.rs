// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory filesystem fake for tests
#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;
use bitmover_core::{FileEntry, FileKind};
use parking_lot::Mutex;

use super::{DiskUsage, FileReader, FsAdapter, FsError};

#[derive(Debug, Clone)]
struct FakeFile {
    data: Option<Vec<u8>>,
    size: u64,
    mtime: SystemTime,
    kind: FileKind,
}

#[derive(Default)]
struct FakeFsState {
    files: BTreeMap<PathBuf, FakeFile>,
    dirs: BTreeSet<PathBuf>,
    devices: Vec<(PathBuf, u64)>,
    disk: Option<DiskUsage>,
    denied: BTreeSet<PathBuf>,
    broken: BTreeSet<PathBuf>,
    failing_renames: BTreeMap<PathBuf, u32>,
    renames: Vec<(PathBuf, PathBuf)>,
    unlinked: Vec<PathBuf>,
}

impl FakeFsState {
    fn device_of(&self, path: &Path) -> u64 {
        self.devices
            .iter()
            .filter(|(prefix, _)| path.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.as_os_str().len())
            .map(|(_, id)| *id)
            .unwrap_or(1)
    }

    fn check_denied(&self, path: &Path) -> Result<(), FsError> {
        if self.denied.contains(path) {
            return Err(FsError::Permission(path.to_path_buf()));
        }
        if self.broken.contains(path) {
            return Err(FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::other("injected io failure"),
            });
        }
        Ok(())
    }
}

/// In-memory filesystem with settable mtimes, device ids, and injectable
/// permission failures. Records renames and unlinks for assertions.
#[derive(Clone, Default)]
pub struct FakeFsAdapter {
    inner: Arc<Mutex<FakeFsState>>,
}

impl FakeFsAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.inner.lock().dirs.insert(path.into());
    }

    /// Add a regular file of `size` zero bytes.
    pub fn add_file(&self, path: impl Into<PathBuf>, size: u64, mtime: SystemTime) {
        self.inner.lock().files.insert(
            path.into(),
            FakeFile {
                data: None,
                size,
                mtime,
                kind: FileKind::Regular,
            },
        );
    }

    pub fn add_file_with_data(&self, path: impl Into<PathBuf>, data: &[u8], mtime: SystemTime) {
        self.inner.lock().files.insert(
            path.into(),
            FakeFile {
                size: data.len() as u64,
                data: Some(data.to_vec()),
                mtime,
                kind: FileKind::Regular,
            },
        );
    }

    /// Add a non-regular entry (socket, fifo, ...).
    pub fn add_other(&self, path: impl Into<PathBuf>, mtime: SystemTime) {
        self.inner.lock().files.insert(
            path.into(),
            FakeFile {
                data: None,
                size: 0,
                mtime,
                kind: FileKind::Other,
            },
        );
    }

    pub fn set_size(&self, path: &Path, size: u64) {
        if let Some(file) = self.inner.lock().files.get_mut(path) {
            file.size = size;
        }
    }

    /// Map every path under `prefix` to a device id (longest prefix wins;
    /// unmapped paths are device 1).
    pub fn set_device(&self, prefix: impl Into<PathBuf>, id: u64) {
        self.inner.lock().devices.push((prefix.into(), id));
    }

    pub fn set_disk_usage(&self, used_bytes: u64, total_bytes: u64) {
        self.inner.lock().disk = Some(DiskUsage {
            used_bytes,
            total_bytes,
        });
    }

    /// Any operation on `path` fails with `Permission`.
    pub fn deny(&self, path: impl Into<PathBuf>) {
        self.inner.lock().denied.insert(path.into());
    }

    /// Any operation on `path` fails with an `Io` error.
    pub fn break_path(&self, path: impl Into<PathBuf>) {
        self.inner.lock().broken.insert(path.into());
    }

    /// Clear an injected `Io` failure.
    pub fn repair_path(&self, path: &Path) {
        self.inner.lock().broken.remove(path);
    }

    /// Make the next `n` renames of `path` fail with an `Io` error.
    pub fn fail_next_renames(&self, path: impl Into<PathBuf>, n: u32) {
        self.inner.lock().failing_renames.insert(path.into(), n);
    }

    pub fn contains(&self, path: &Path) -> bool {
        let state = self.inner.lock();
        state.files.contains_key(path) || state.dirs.contains(path)
    }

    /// Recorded renames, in order.
    pub fn renames(&self) -> Vec<(PathBuf, PathBuf)> {
        self.inner.lock().renames.clone()
    }

    /// Recorded unlinks, in order.
    pub fn unlinked(&self) -> Vec<PathBuf> {
        self.inner.lock().unlinked.clone()
    }
}

#[async_trait]
impl FsAdapter for FakeFsAdapter {
    async fn scan_dir(&self, dir: &Path) -> Result<Vec<FileEntry>, FsError> {
        let state = self.inner.lock();
        state.check_denied(dir)?;
        if !state.dirs.contains(dir) {
            return Err(FsError::NotFound(dir.to_path_buf()));
        }
        let mut entries: Vec<FileEntry> = state
            .files
            .iter()
            .filter(|(path, _)| path.parent() == Some(dir))
            .map(|(path, file)| FileEntry {
                path: path.clone(),
                mtime: file.mtime,
                size: file.size,
                kind: file.kind,
            })
            .collect();
        entries.extend(
            state
                .dirs
                .iter()
                .filter(|path| path.parent() == Some(dir))
                .map(|path| FileEntry {
                    path: path.clone(),
                    mtime: SystemTime::UNIX_EPOCH,
                    size: 0,
                    kind: FileKind::Directory,
                }),
        );
        Ok(entries)
    }

    async fn lstat(&self, path: &Path) -> Result<FileEntry, FsError> {
        let state = self.inner.lock();
        state.check_denied(path)?;
        if let Some(file) = state.files.get(path) {
            return Ok(FileEntry {
                path: path.to_path_buf(),
                mtime: file.mtime,
                size: file.size,
                kind: file.kind,
            });
        }
        if state.dirs.contains(path) {
            return Ok(FileEntry {
                path: path.to_path_buf(),
                mtime: SystemTime::UNIX_EPOCH,
                size: 0,
                kind: FileKind::Directory,
            });
        }
        Err(FsError::NotFound(path.to_path_buf()))
    }

    async fn rename(&self, src: &Path, dst: &Path) -> Result<(), FsError> {
        let mut state = self.inner.lock();
        state.check_denied(src)?;
        state.check_denied(dst)?;
        if let Some(remaining) = state.failing_renames.get_mut(src) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(FsError::Io {
                    path: src.to_path_buf(),
                    source: std::io::Error::other("injected rename failure"),
                });
            }
        }
        if state.device_of(src) != state.device_of(dst) {
            return Err(FsError::CrossDevice {
                src: src.to_path_buf(),
                dst: dst.to_path_buf(),
            });
        }
        let file = state
            .files
            .remove(src)
            .ok_or_else(|| FsError::NotFound(src.to_path_buf()))?;
        state.files.insert(dst.to_path_buf(), file);
        state.renames.push((src.to_path_buf(), dst.to_path_buf()));
        Ok(())
    }

    async fn unlink(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.inner.lock();
        state.check_denied(path)?;
        state
            .files
            .remove(path)
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))?;
        state.unlinked.push(path.to_path_buf());
        Ok(())
    }

    async fn open_read(&self, path: &Path) -> Result<FileReader, FsError> {
        let state = self.inner.lock();
        state.check_denied(path)?;
        let file = state
            .files
            .get(path)
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))?;
        let data = file
            .data
            .clone()
            .unwrap_or_else(|| vec![0; file.size as usize]);
        Ok(Box::pin(std::io::Cursor::new(data)))
    }

    async fn disk_usage(&self, _path: &Path) -> Result<DiskUsage, FsError> {
        Ok(self.inner.lock().disk.unwrap_or(DiskUsage {
            used_bytes: 0,
            total_bytes: 0,
        }))
    }

    async fn mkdir_p(&self, path: &Path) -> Result<(), FsError> {
        let mut state = self.inner.lock();
        state.check_denied(path)?;
        let mut current = path.to_path_buf();
        loop {
            state.dirs.insert(current.clone());
            match current.parent() {
                Some(parent) if parent != Path::new("") => current = parent.to_path_buf(),
                _ => break,
            }
        }
        Ok(())
    }

    async fn exists(&self, path: &Path) -> Result<bool, FsError> {
        let state = self.inner.lock();
        state.check_denied(path)?;
        Ok(state.files.contains_key(path) || state.dirs.contains(path))
    }

    async fn device_id(&self, path: &Path) -> Result<u64, FsError> {
        let state = self.inner.lock();
        state.check_denied(path)?;
        Ok(state.device_of(path))
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
