//! End-to-end CLI tests for the iiif-timer binary.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let mut cmd = Command::cargo_bin("iiif-timer").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Time the first-view downloads"))
        .stdout(predicate::str::contains("THREAD_COUNT"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let mut cmd = Command::cargo_bin("iiif-timer").unwrap();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("iiif-timer"));
}

/// Test that missing positional arguments print usage and exit with code 1.
#[test]
fn test_binary_without_args_exits_one() {
    let mut cmd = Command::cargo_bin("iiif-timer").unwrap();
    cmd.assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_binary_non_integer_thread_count_exits_one() {
    let mut cmd = Command::cargo_bin("iiif-timer").unwrap();
    cmd.args(["https://iiif.example.org", "ms-1", "many"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("many"));
}

#[test]
fn test_binary_invalid_flag_exits_one() {
    let mut cmd = Command::cargo_bin("iiif-timer").unwrap();
    cmd.arg("--invalid-flag")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_invalid_server_fails() {
    let mut cmd = Command::cargo_bin("iiif-timer").unwrap();
    cmd.args(["-q", "not a url", "ms-1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid IIIF server URL"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_prints_summary_for_mock_server() {
    let mock_server = MockServer::start().await;
    let server = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ms-1/manifest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sequences": [{
                "canvases": [{
                    "thumbnail": { "@id": format!("{server}/thumbs/0.jpg") },
                    "images": [{ "resource": { "service": { "@id": format!("{server}/iiif/img1") } } }]
                }]
            }]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thumbs/0.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"thumb".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/iiif/img1/info.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"width": 2000, "height": 1500})))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/iiif/img1/.+/0/default\.jpg$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"tile".to_vec()))
        .mount(&mock_server)
        .await;

    let assert = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("iiif-timer")
            .unwrap()
            .args(["-q", &server, "ms-1", "2"])
            .assert()
    })
    .await
    .unwrap();

    assert
        .success()
        .stdout(predicate::str::contains("Thumbnails: 1 downloaded"))
        .stdout(predicate::str::contains("Total perceived time:"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_binary_json_report() {
    let mock_server = MockServer::start().await;
    let server = mock_server.uri();

    Mock::given(method("GET"))
        .and(path("/ms-1/manifest"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "sequences": [{
                "canvases": [{
                    "thumbnail": format!("{server}/thumbs/0.jpg"),
                    "images": [{ "resource": { "service": { "@id": format!("{server}/iiif/img1") } } }]
                }]
            }]
        })))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thumbs/0.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"thumb".to_vec()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/iiif/img1/info.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"width": 640, "height": 480})))
        .mount(&mock_server)
        .await;

    let output = tokio::task::spawn_blocking(move || {
        Command::cargo_bin("iiif-timer")
            .unwrap()
            .args(["-q", "--json", &server, "ms-1"])
            .output()
            .unwrap()
    })
    .await
    .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["thumbnail_count"], 1);
    assert_eq!(report["summary"]["tile_count"], 0);
    assert_eq!(report["planned_tiles"], 0);
}
