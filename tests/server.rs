//! HTTP surface: `/search` and `/health` driven in-process.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::ServiceExt;

use gosearch_proxy::dispatch::GosearchRunner;
use gosearch_proxy::dispatch::install::BinaryLocator;
use gosearch_proxy::parsers::gosearch::GosearchParser;
use gosearch_proxy::server::{AppState, router};

const REPORT: &str = include_str!("fixtures/report.txt");

fn scratch_dir(test_name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "gosearch-proxy-server-{test_name}-{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Fake gosearch that prints `stdout_file` and exits with `code`.
fn fake_gosearch(dir: &Path, stdout_file: &Path, code: i32) -> PathBuf {
    let bin = dir.join("gosearch");
    std::fs::write(
        &bin,
        format!(
            "#!/bin/sh\ncat '{}'\necho \"searched $2\" >&2\nexit {code}\n",
            stdout_file.display()
        ),
    )
    .unwrap();
    std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();
    bin
}

fn app_with_binary(bin: Option<PathBuf>, timeout: Duration) -> axum::Router {
    let locator = BinaryLocator {
        override_path: bin,
        gobin: None,
        gopath: None,
        go_program: None,
        skip_go_env: true,
        skip_path_lookup: true,
    };
    router(AppState::new(
        GosearchRunner::new(locator, timeout),
        GosearchParser::default(),
    ))
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app_with_binary(None, Duration::from_secs(1));
    let (status, json) = get_json(app, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn search_returns_parsed_results_and_raw_output() {
    let dir = scratch_dir("search-ok");
    let report = dir.join("report.txt");
    std::fs::write(&report, REPORT).unwrap();
    let bin = fake_gosearch(&dir, &report, 0);

    let app = app_with_binary(Some(bin), Duration::from_secs(10));
    let (status, json) = get_json(app, "/search?username=alice").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "alice");
    assert_eq!(json["exit_code"], 0);
    assert_eq!(json["stdout"], REPORT);
    assert_eq!(json["stderr"], "searched alice\n");

    let results = json["results"].as_array().unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0]["name"], "Twitter");
    assert_eq!(results[0]["url"], "https://twitter.com/alice");
    assert_eq!(results[0]["found"], true);
    assert_eq!(results[1]["name"], "GitHub");
    assert_eq!(results[2]["name"], "Mastodon");
}

#[tokio::test]
async fn search_nonzero_exit_still_200_with_partial_results() {
    let dir = scratch_dir("search-partial");
    let report = dir.join("report.txt");
    std::fs::write(
        &report,
        "\x1b[32m[+] Twitter: https://twitter.com/bob\x1b[0m\npanic: connection reset\n",
    )
    .unwrap();
    let bin = fake_gosearch(&dir, &report, 1);

    let app = app_with_binary(Some(bin), Duration::from_secs(10));
    let (status, json) = get_json(app, "/search?username=bob").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["exit_code"], 1);
    assert_eq!(json["results"].as_array().unwrap().len(), 1);
    assert_eq!(json["results"][0]["url"], "https://twitter.com/bob");
}

#[tokio::test]
async fn search_with_no_findings_returns_empty_results() {
    let dir = scratch_dir("search-empty");
    let report = dir.join("report.txt");
    std::fs::write(&report, ":: Username : carol\nNumber of profiles found : 0\n").unwrap();
    let bin = fake_gosearch(&dir, &report, 0);

    let app = app_with_binary(Some(bin), Duration::from_secs(10));
    let (status, json) = get_json(app, "/search?username=carol").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["results"], serde_json::json!([]));
}

#[tokio::test]
async fn search_missing_username_is_bad_request() {
    let app = app_with_binary(None, Duration::from_secs(1));
    for uri in ["/search", "/search?username=", "/search?username=%20%20"] {
        let (status, json) = get_json(app.clone(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(json["error"], "username query param is required");
    }
}

#[tokio::test]
async fn search_dash_prefixed_username_is_passed_through() {
    let dir = scratch_dir("search-dash");
    let report = dir.join("report.txt");
    std::fs::write(&report, "[+] Twitter: https://twitter.com/-alice\n").unwrap();
    let bin = fake_gosearch(&dir, &report, 0);

    let app = app_with_binary(Some(bin), Duration::from_secs(10));
    let (status, json) = get_json(app, "/search?username=-alice").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "-alice");
    assert_eq!(json["stderr"], "searched -alice\n");
    assert_eq!(json["results"][0]["url"], "https://twitter.com/-alice");
}

#[tokio::test]
async fn search_control_character_username_is_bad_request() {
    let app = app_with_binary(None, Duration::from_secs(1));
    let (status, json) = get_json(app, "/search?username=al%07ice").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("invalid username"));
}

#[tokio::test]
async fn search_without_binary_is_server_error() {
    let dir = scratch_dir("search-nobin");
    let app = app_with_binary(
        Some(dir.join("definitely-not-here")),
        Duration::from_secs(1),
    );
    let (status, json) = get_json(app, "/search?username=alice").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("binary not found"));
}

#[tokio::test]
async fn search_timeout_is_server_error() {
    let dir = scratch_dir("search-timeout");
    let bin = dir.join("gosearch");
    std::fs::write(&bin, "#!/bin/sh\necho '[+] X: https://x.example'\nsleep 30\n").unwrap();
    std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

    let app = app_with_binary(Some(bin), Duration::from_millis(300));
    let (status, json) = get_json(app, "/search?username=alice").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let app = app_with_binary(None, Duration::from_secs(1));
    let (status, _) = get_json(app, "/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
