// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O
//!
//! Every interaction with the outside world — the staging filesystem, the
//! remote ingest endpoint, kernel directory events — goes through one of
//! the adapter traits here. Pipeline workers are written against the traits
//! and exercised in tests with the fake implementations.

pub mod fs;
pub mod http;
pub mod watch;

pub use fs::{DiskUsage, FileReader, FsAdapter, FsError, TokioFsAdapter};
pub use http::{HttpAdapter, HttpError, ReqwestHttpAdapter, UploadRequest};
pub use watch::{FsEventWatchAdapter, WatchAdapter, WatchError, WatchStream};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use fs::FakeFsAdapter;
#[cfg(any(test, feature = "test-support"))]
pub use http::{FakeHttpAdapter, FakeResponse, UploadCall};
#[cfg(any(test, feature = "test-support"))]
pub use watch::FakeWatchAdapter;
