// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use url::Url;

fn request(filename: &str, body: &[u8]) -> UploadRequest {
    UploadRequest {
        url: Url::parse("https://ingest.example.com/pcap").unwrap(),
        filename: filename.to_string(),
        size: body.len() as u64,
        body: Box::pin(std::io::Cursor::new(body.to_vec())),
    }
}

#[tokio::test]
async fn empty_script_answers_200_and_records_body() {
    let http = FakeHttpAdapter::new();

    let status = http.post_file(request("a.pcap", b"bytes")).await.unwrap();
    assert_eq!(status, 200);

    let calls = http.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].filename, "a.pcap");
    assert_eq!(calls[0].size, 5);
    assert_eq!(calls[0].body, b"bytes");
}

#[tokio::test]
async fn script_replays_in_order() {
    let http = FakeHttpAdapter::new();
    http.push_status(503);
    http.push(FakeResponse::Timeout);
    http.push_status(200);

    assert_eq!(http.post_file(request("a", b"")).await.unwrap(), 503);
    assert!(matches!(
        http.post_file(request("a", b"")).await,
        Err(HttpError::Timeout)
    ));
    assert_eq!(http.post_file(request("a", b"")).await.unwrap(), 200);
    assert_eq!(http.call_count(), 3);
}
