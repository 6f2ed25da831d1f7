//! Integration tests for timed fetches and the worker pool.
//!
//! These tests run real HTTP requests against mock servers.

use std::sync::Arc;
use std::time::Duration;

use iiif_timer::download::{
    DownloadError, DownloadReport, DownloadTask, FetchKind, HttpClient, PoolError, WorkerPool,
};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to create a mock server with a single JPEG-ish endpoint.
async fn setup_mock_image(path_str: &str, body: &[u8]) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(path_str))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
        .mount(&mock_server)
        .await;

    mock_server
}

#[tokio::test]
async fn test_fetch_reads_whole_body() {
    let body = vec![0xFF_u8; 64 * 1024];
    let mock_server = setup_mock_image("/thumbs/1.jpg", &body).await;
    let client = HttpClient::new().expect("client should build");

    let url = format!("{}/thumbs/1.jpg", mock_server.uri());
    let fetched = client.fetch(&url).await.expect("fetch should succeed");

    assert_eq!(fetched.bytes.len(), body.len());
}

#[tokio::test]
async fn test_fetch_elapsed_covers_server_delay() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow.jpg"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"slow".to_vec())
                .set_delay(Duration::from_millis(120)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().expect("client should build");
    let fetched = client
        .fetch(&format!("{}/slow.jpg", mock_server.uri()))
        .await
        .expect("fetch should succeed");

    assert!(
        fetched.elapsed_ms() >= 120,
        "elapsed {} ms should include the server delay",
        fetched.elapsed_ms()
    );
}

#[tokio::test]
async fn test_fetch_http_404_is_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().expect("client should build");
    let result = client
        .fetch(&format!("{}/missing.jpg", mock_server.uri()))
        .await;

    assert!(matches!(
        result,
        Err(DownloadError::HttpStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_fetch_text_decodes_utf8() {
    let mock_server = setup_mock_image("/info.json", br#"{"width":10,"height":20}"#).await;
    let client = HttpClient::new().expect("client should build");

    let (text, _) = client
        .fetch_text(&format!("{}/info.json", mock_server.uri()))
        .await
        .expect("fetch should succeed");

    assert!(text.contains("\"width\":10"));
}

#[tokio::test]
async fn test_fetch_text_rejects_binary_body() {
    let mock_server = setup_mock_image("/binary", &[0xC3, 0x28, 0xFF]).await;
    let client = HttpClient::new().expect("client should build");

    let result = client
        .fetch_text(&format!("{}/binary", mock_server.uri()))
        .await;

    assert!(matches!(result, Err(DownloadError::NotText { .. })));
}

#[tokio::test]
async fn test_pool_records_every_download_by_kind() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/thumbs/\d+\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"thumb".to_vec()))
        .expect(8)
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().expect("client should build");
    let report = Arc::new(DownloadReport::new());
    let urls = (0..8).map(|i| format!("{}/thumbs/{i}.jpg", mock_server.uri()));

    let pool = WorkerPool::new(3).expect("valid pool size");
    let outcome = pool
        .run(
            DownloadTask::batch(urls, FetchKind::Thumbnail),
            &client,
            &report,
        )
        .await
        .expect("all downloads should succeed");

    assert_eq!(outcome.completed, 8);
    assert_eq!(report.thumbnail_times().len(), 8);
    assert!(report.tile_times().is_empty());
}

#[tokio::test]
async fn test_pool_bounds_concurrency() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/tiles/\d+\.jpg$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"tile".to_vec())
                .set_delay(Duration::from_millis(100)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().expect("client should build");
    let report = Arc::new(DownloadReport::new());
    let urls = (0..4).map(|i| format!("{}/tiles/{i}.jpg", mock_server.uri()));

    // Four 100 ms downloads on two workers need at least two rounds
    let pool = WorkerPool::new(2).expect("valid pool size");
    let outcome = pool
        .run(DownloadTask::batch(urls, FetchKind::Tile), &client, &report)
        .await
        .expect("all downloads should succeed");

    assert!(
        outcome.elapsed >= Duration::from_millis(200),
        "phase took {:?}",
        outcome.elapsed
    );
    assert_eq!(report.tile_times().len(), 4);
    let slowest = report.tile_times().into_iter().max().unwrap_or_default();
    assert!(outcome.elapsed.as_millis() >= u128::from(slowest));
}

#[tokio::test]
async fn test_pool_fails_fast_on_first_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/thumbs/bad.jpg"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/thumbs/\d+\.jpg$"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(b"thumb".to_vec())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = HttpClient::new().expect("client should build");
    let report = Arc::new(DownloadReport::new());
    let mut urls = vec![format!("{}/thumbs/bad.jpg", mock_server.uri())];
    urls.extend((0..3).map(|i| format!("{}/thumbs/{i}.jpg", mock_server.uri())));

    let pool = WorkerPool::new(4).expect("valid pool size");
    let started = std::time::Instant::now();
    let result = pool
        .run(
            DownloadTask::batch(urls, FetchKind::Thumbnail),
            &client,
            &report,
        )
        .await;

    assert!(matches!(
        result,
        Err(PoolError::Download(DownloadError::HttpStatus { status: 500, .. }))
    ));
    // The slow downloads are aborted rather than awaited
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(report.thumbnail_times().is_empty());
}

#[tokio::test]
async fn test_task_records_nothing_on_failure() {
    let client = HttpClient::new().expect("client should build");
    let report = DownloadReport::new();

    let task = DownloadTask::new("not a url", FetchKind::Tile);
    let result = task.run(&client, &report).await;

    assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    assert!(report.tile_times().is_empty());
}
