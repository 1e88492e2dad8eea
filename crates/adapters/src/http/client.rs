// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Real ingest client backed by `reqwest`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE};
use tokio_util::io::ReaderStream;

use super::{HttpAdapter, HttpError, UploadRequest};

/// Streaming HTTP client for the ingest endpoint.
///
/// Redirects are disabled: the endpoint is a fixed POST target and a
/// redirect would silently re-send the body elsewhere.
#[derive(Clone)]
pub struct ReqwestHttpAdapter {
    client: reqwest::Client,
}

impl ReqwestHttpAdapter {
    pub fn new(verify_ssl: bool, request_timeout: Duration) -> Result<Self, HttpError> {
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .danger_accept_invalid_certs(!verify_ssl)
            .timeout(request_timeout)
            .build()
            .map_err(|e| HttpError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

fn classify(err: reqwest::Error) -> HttpError {
    if err.is_timeout() {
        HttpError::Timeout
    } else if err.is_connect() {
        HttpError::Connect(err.to_string())
    } else {
        HttpError::Transport(err.to_string())
    }
}

#[async_trait]
impl HttpAdapter for ReqwestHttpAdapter {
    async fn post_file(&self, request: UploadRequest) -> Result<u16, HttpError> {
        let body = reqwest::Body::wrap_stream(ReaderStream::new(request.body));
        let response = self
            .client
            .post(request.url.as_str())
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, request.size)
            .header("X-Filename", request.filename)
            .body(body)
            .send()
            .await
            .map_err(classify)?;
        Ok(response.status().as_u16())
    }
}
