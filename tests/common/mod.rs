#![allow(dead_code)]

use std::time::Duration;

use dd_cli::{ClientOptions, Credential, DatadogClient};
use serde_json::{json, Value};
use wiremock::MockServer;

pub const COOKIE: &str = "session-cookie";
pub const CSRF: &str = "csrf-token-value";

pub fn fast_options() -> ClientOptions {
    ClientOptions {
        initial_backoff: Duration::from_millis(5),
        ..ClientOptions::default()
    }
}

pub fn credential(server: &MockServer) -> Credential {
    Credential::new(COOKIE, CSRF, server.uri())
}

pub fn client(server: &MockServer) -> DatadogClient {
    DatadogClient::with_options(&credential(server), fast_options()).unwrap()
}

/// `count` list events with ids `{prefix}-0..`.
pub fn events(prefix: &str, count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| {
            let id = format!("{prefix}-{i}");
            json!({ "id": id, "event": { "id": id, "message": "hello", "service": "api" } })
        })
        .collect()
}

/// The `list.startAt` of a list request, if any.
pub fn start_at(req: &wiremock::Request) -> Option<String> {
    let body: Value = serde_json::from_slice(&req.body).ok()?;
    body.pointer("/list/startAt")
        .and_then(Value::as_str)
        .map(str::to_string)
}
