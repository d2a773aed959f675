mod common;

use std::path::PathBuf;

use clap::Parser;
use dd_cli::cli::Cli;
use dd_cli::commands::{App, EXIT_FAILURE, EXIT_OK};
use dd_cli::credentials;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Run {
    code: u8,
    stdout: String,
    stderr: String,
}

impl Run {
    fn lines(&self) -> Vec<Value> {
        self.stdout
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

async fn run(auth_file: PathBuf, args: &[&str]) -> Run {
    let argv = std::iter::once("dd-cli").chain(args.iter().copied());
    let cli = Cli::try_parse_from(argv).unwrap();
    let app = App::new(auth_file, common::fast_options());
    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = app.execute(cli.command, &mut out, &mut err).await;
    Run {
        code,
        stdout: String::from_utf8(out).unwrap(),
        stderr: String::from_utf8(err).unwrap(),
    }
}

/// An auth file pointing at `server`.
fn configured(server: &MockServer) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let auth_file = dir.path().join("auth");
    credentials::save_to(&auth_file, &common::credential(server)).unwrap();
    (dir, auth_file)
}

async fn mount_list(server: &MockServer, source: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/api/v1/logs-analytics/list"))
        .and(query_param("type", source))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn missing_auth_exits_one_with_remediation() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(dir.path().join("absent"), &["list", "*"]).await;

    assert_eq!(result.code, EXIT_FAILURE);
    assert_eq!(result.stderr.trim(), "No auth found. Run: dd-cli auth");
    assert!(result.stdout.is_empty());
}

#[tokio::test]
async fn fetch_all_streams_ndjson_and_counts() {
    let server = MockServer::start().await;
    mount_list(&server, "logs", json!({ "result": { "events": common::events("log", 3) } })).await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["fetch-all", "service:api", "--max", "10"]).await;

    assert_eq!(result.code, EXIT_OK);
    let lines = result.lines();
    assert_eq!(lines.len(), 3);
    assert_eq!(lines[2]["id"], "log-2");
    assert_eq!(result.stderr.trim(), "Fetched 3 logs");
}

#[tokio::test]
async fn rum_fetch_all_counts_rum_events() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs-analytics/list"))
        .and(query_param("type", "rum"))
        .and(body_partial_json(json!({ "list": { "search": { "query": "@type:error app:web" } } })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "result": { "events": common::events("rum", 2) } })),
        )
        .expect(1)
        .mount(&server)
        .await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["rum", "fetch-all", "app:web", "--type", "error"]).await;

    assert_eq!(result.code, EXIT_OK);
    assert_eq!(result.lines().len(), 2);
    assert_eq!(result.stderr.trim(), "Fetched 2 RUM events");
}

#[tokio::test]
async fn deep_emits_hydrated_records() {
    let server = MockServer::start().await;
    mount_list(&server, "logs", json!({ "result": { "events": common::events("d", 2) } })).await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs-analytics/fetch_one"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "result": { "full": true } })),
        )
        .expect(2)
        .mount(&server)
        .await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["deep", "*", "--concurrency", "2"]).await;

    assert_eq!(result.code, EXIT_OK);
    let lines = result.lines();
    assert_eq!(lines.len(), 2);
    assert!(lines
        .iter()
        .all(|l| l["full_event"]["result"]["full"] == true && l.get("error").is_none()));
    assert!(result
        .stderr
        .contains("Hydrating 2 logs with concurrency=2..."));
    assert_eq!(result.stderr.lines().last(), Some("Deep-fetched 2 logs"));
}

#[tokio::test]
async fn deep_with_no_matches_reports_zero() {
    let server = MockServer::start().await;
    mount_list(&server, "logs", json!({ "result": { "events": [] } })).await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["deep", "*"]).await;

    assert_eq!(result.code, EXIT_OK);
    assert!(result.stdout.is_empty());
    assert_eq!(result.stderr.trim(), "Deep-fetched 0 logs");
}

#[tokio::test]
async fn status_fails_when_probe_lacks_result() {
    let server = MockServer::start().await;
    mount_list(&server, "logs", json!({})).await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["status"]).await;

    assert_eq!(result.code, EXIT_FAILURE);
    assert!(result.stderr.contains(&format!("Base URL: {}", server.uri())));
    assert!(result
        .stderr
        .contains("✗ Connection failed - tokens may be expired"));
}

#[tokio::test]
async fn status_succeeds_when_connected() {
    let server = MockServer::start().await;
    mount_list(&server, "logs", json!({ "result": { "events": [] } })).await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["status"]).await;

    assert_eq!(result.code, EXIT_OK);
    assert!(result.stderr.contains("✓ Connection successful"));
}

#[tokio::test]
async fn status_without_auth_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(dir.path().join("absent"), &["status"]).await;

    assert_eq!(result.code, EXIT_FAILURE);
    assert!(result.stderr.contains("✗ No auth file found"));
}

#[tokio::test]
async fn rum_sessions_print_simplified_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs-analytics/list"))
        .and(query_param("type", "rum"))
        .and(body_partial_json(json!({ "list": { "search": { "query": "@type:session C-1" } } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": { "events": [{ "event": { "@type": "session", "@session.id": "s-1" } }] }
        })))
        .expect(1)
        .mount(&server)
        .await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["rum", "sessions", "C-1", "--simplified", "--pretty"]).await;

    assert_eq!(result.code, EXIT_OK);
    assert!(result.stdout.lines().count() > 1);
    let body: Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(body["count"], 1);
    assert_eq!(body["events"][0]["session_id"], "s-1");
}

#[tokio::test]
async fn request_failure_prints_error_and_exits_one() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/logs-analytics/aggregate"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad field"))
        .mount(&server)
        .await;
    let (_dir, auth_file) = configured(&server);

    let result = run(auth_file, &["top", "*", "--field", "nope"]).await;

    assert_eq!(result.code, EXIT_FAILURE);
    assert!(result.stderr.starts_with("Error: HTTP 400"));
    assert!(result.stderr.contains("bad field"));
    assert!(result.stdout.is_empty());
}
