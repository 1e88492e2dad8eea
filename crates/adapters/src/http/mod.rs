// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote ingest seam.
//!
//! The uploader hands a streaming body to [`HttpAdapter::post_file`] and
//! gets back either a status code or a transport-level [`HttpError`]. Status
//! classification (success / permanent / transient) stays with the caller;
//! transport errors are always transient.

mod client;

pub use client::ReqwestHttpAdapter;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeHttpAdapter, FakeResponse, UploadCall};

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::fs::FileReader;

/// One streaming upload through the ingest seam.
pub struct UploadRequest {
    pub url: Url,
    /// Basename, sent as the `X-Filename` header.
    pub filename: String,
    pub size: u64,
    pub body: FileReader,
}

/// Transport-level upload failures. All of these are retryable.
#[derive(Debug, Error)]
pub enum HttpError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Adapter for POSTing file bodies to the remote ingest endpoint.
#[async_trait]
pub trait HttpAdapter: Clone + Send + Sync + 'static {
    /// POST the body; returns the response status code.
    async fn post_file(&self, request: UploadRequest) -> Result<u16, HttpError>;
}
