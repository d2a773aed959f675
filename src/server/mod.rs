use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::info;
use uuid::Uuid;

use crate::client::ClientOptions;

mod schema;
mod tools;

const JSONRPC_METHOD_NOT_FOUND: i32 = -32601;
const JSONRPC_INVALID_PARAMS: i32 = -32602;
const PROTOCOL_VERSION: &str = "2024-11-05";

/// Credentials are re-read on every call so `dd-cli auth` takes effect without a restart.
#[derive(Debug, Clone)]
pub struct ServerContext {
    pub auth_file: PathBuf,
    pub options: ClientOptions,
}

pub async fn run(ctx: ServerContext) -> Result<()> {
    let session_id = Uuid::new_v4();
    info!(%session_id, auth_file = %ctx.auth_file.display(), "mcp server started");
    let calls = serve(
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        &ctx,
    )
    .await?;
    info!(%session_id, calls, "mcp server stopped");
    Ok(())
}

/// Answer newline-delimited JSON-RPC requests until `reader` closes. Returns the tool call count.
pub async fn serve<R, W>(reader: R, mut writer: W, ctx: &ServerContext) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut calls = 0u64;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let msg: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(error = %e, "ignoring malformed message");
                continue;
            }
        };
        if msg.get("method").and_then(Value::as_str) == Some("tools/call") {
            calls += 1;
        }
        if let Some(response) = dispatch(&msg, ctx).await {
            let json = serde_json::to_string(&response)?;
            writer.write_all(json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
    Ok(calls)
}

/// Route one message. Notifications (no `id`) get no reply.
pub async fn dispatch(msg: &Value, ctx: &ServerContext) -> Option<Value> {
    let method = msg.get("method")?.as_str()?;
    let is_request = msg.get("id").is_some_and(|id| !id.is_null());

    match method {
        "initialize" => Some(on_initialize(msg)),
        "ping" => Some(json!({ "jsonrpc": "2.0", "id": msg["id"], "result": {} })),
        "tools/list" => Some(schema::on_tools_list(msg)),
        "tools/call" => Some(on_tool_call(msg, ctx).await),
        _ if is_request => Some(error_response(
            msg,
            JSONRPC_METHOD_NOT_FOUND,
            &format!("method not found: {method}"),
        )),
        _ => None,
    }
}

fn on_initialize(msg: &Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": msg["id"],
        "result": {
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": { "name": "datadog", "version": env!("CARGO_PKG_VERSION") },
            "instructions": "Query Datadog logs and RUM data for debugging and observability",
        },
    })
}

async fn on_tool_call(msg: &Value, ctx: &ServerContext) -> Value {
    let params = msg.get("params").unwrap_or(&Value::Null);
    let tool = params.get("name").and_then(Value::as_str).unwrap_or("");
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let started = Instant::now();
    let result = tools::execute(tool, &arguments, ctx).await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(result) => {
            info!(tool, elapsed_ms, is_error = result.is_error, "tool call");
            let text = serde_json::to_string(&result.body).unwrap_or_default();
            json!({
                "jsonrpc": "2.0",
                "id": msg["id"],
                "result": {
                    "content": [{ "type": "text", "text": text }],
                    "isError": result.is_error,
                },
            })
        }
        Err(e) => {
            info!(tool, elapsed_ms, error = %e.message(), "tool call rejected");
            error_response(msg, JSONRPC_INVALID_PARAMS, &e.message())
        }
    }
}

fn error_response(msg: &Value, code: i32, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": msg["id"],
        "error": { "code": code, "message": message },
    })
}
