// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake ingest client for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::AsyncReadExt;

use super::{HttpAdapter, HttpError, UploadRequest};

/// Scripted response for one upload attempt.
#[derive(Debug, Clone)]
pub enum FakeResponse {
    Status(u16),
    Timeout,
    ConnectError,
    /// Sleep before answering; lets tests hold an upload in flight.
    Stall(Duration, u16),
}

/// Recorded upload attempt.
#[derive(Debug, Clone)]
pub struct UploadCall {
    pub url: String,
    pub filename: String,
    pub size: u64,
    pub body: Vec<u8>,
}

struct FakeHttpState {
    script: VecDeque<FakeResponse>,
    calls: Vec<UploadCall>,
}

/// Fake ingest client: replays a scripted response sequence and records
/// every attempt. An empty script answers 200.
#[derive(Clone)]
pub struct FakeHttpAdapter {
    inner: Arc<Mutex<FakeHttpState>>,
}

impl Default for FakeHttpAdapter {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeHttpState {
                script: VecDeque::new(),
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeHttpAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: FakeResponse) {
        self.inner.lock().script.push_back(response);
    }

    pub fn push_status(&self, status: u16) {
        self.push(FakeResponse::Status(status));
    }

    /// All recorded attempts, in order.
    pub fn calls(&self) -> Vec<UploadCall> {
        self.inner.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.lock().calls.len()
    }
}

#[async_trait]
impl HttpAdapter for FakeHttpAdapter {
    async fn post_file(&self, request: UploadRequest) -> Result<u16, HttpError> {
        let mut body = Vec::new();
        let mut reader = request.body;
        reader
            .read_to_end(&mut body)
            .await
            .map_err(|e| HttpError::Transport(e.to_string()))?;

        let response = {
            let mut state = self.inner.lock();
            state.calls.push(UploadCall {
                url: request.url.to_string(),
                filename: request.filename,
                size: request.size,
                body,
            });
            state.script.pop_front()
        };

        match response {
            None | Some(FakeResponse::Status(200)) => Ok(200),
            Some(FakeResponse::Status(status)) => Ok(status),
            Some(FakeResponse::Timeout) => Err(HttpError::Timeout),
            Some(FakeResponse::ConnectError) => {
                Err(HttpError::Connect("connection refused".to_string()))
            }
            Some(FakeResponse::Stall(delay, status)) => {
                tokio::time::sleep(delay).await;
                Ok(status)
            }
        }
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
