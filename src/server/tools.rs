use serde_json::{json, Value};

use crate::client::{ClientError, DataSource, DatadogClient, Profile, RumEventType};
use crate::{credentials, status, summary};

use super::ServerContext;

/// Call failures reported as JSON-RPC errors rather than tool results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum CallError {
    InvalidParams(String),
    UnknownTool(String),
}

impl CallError {
    pub(super) fn message(&self) -> String {
        match self {
            Self::InvalidParams(m) => m.clone(),
            Self::UnknownTool(t) => format!("unknown tool: {t}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct ToolResult {
    pub body: Value,
    pub is_error: bool,
}

impl ToolResult {
    fn ok(body: Value) -> Self {
        Self {
            body,
            is_error: false,
        }
    }

    fn failed(error: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            body: json!({ "error": error.into(), "action": action.into() }),
            is_error: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum ToolCall {
    SearchLogs {
        query: String,
        hours: f64,
        limit: u32,
        simplified: bool,
    },
    TraceLogs {
        trace_id: String,
        hours: f64,
        limit: u32,
        simplified: bool,
    },
    FetchLog {
        log_id: String,
    },
    TopValues {
        query: String,
        field: String,
        hours: f64,
        limit: u32,
    },
    Rum {
        kind: RumEventType,
        query: String,
        hours: f64,
        limit: u32,
        simplified: bool,
    },
    SearchFields {
        keyword: String,
        source: DataSource,
    },
    FieldValues {
        field: String,
        query: String,
        source: DataSource,
        hours: f64,
    },
}

const AUTH_STATUS_TOOL: &str = "dd_auth_status";

fn arg_str(args: &Value, key: &str) -> Result<String, CallError> {
    args.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CallError::InvalidParams(format!("missing '{key}'")))
}

fn opt_str(args: &Value, key: &str, default: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn opt_f64(args: &Value, key: &str, default: f64) -> f64 {
    args.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn opt_u32(args: &Value, key: &str, default: u32) -> u32 {
    args.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(default)
}

fn opt_bool(args: &Value, key: &str, default: bool) -> bool {
    args.get(key).and_then(Value::as_bool).unwrap_or(default)
}

/// Anything other than `rum` queries logs.
fn opt_source(args: &Value) -> DataSource {
    match args.get("source").and_then(Value::as_str) {
        Some("rum") => DataSource::Rum,
        _ => DataSource::Logs,
    }
}

impl ToolCall {
    fn parse(tool: &str, args: &Value) -> Result<Self, CallError> {
        let rum = |kind: RumEventType, hours: f64| -> Result<Self, CallError> {
            Ok(Self::Rum {
                kind,
                query: arg_str(args, "query")?,
                hours: opt_f64(args, "hours", hours),
                limit: opt_u32(args, "limit", 50),
                simplified: opt_bool(args, "simplified", true),
            })
        };

        match tool {
            "dd_search_logs" => Ok(Self::SearchLogs {
                query: arg_str(args, "query")?,
                hours: opt_f64(args, "hours", 24.0),
                limit: opt_u32(args, "limit", 50),
                simplified: opt_bool(args, "simplified", true),
            }),
            "dd_trace_logs" => Ok(Self::TraceLogs {
                trace_id: arg_str(args, "trace_id")?,
                hours: opt_f64(args, "hours", 24.0),
                limit: opt_u32(args, "limit", 200),
                simplified: opt_bool(args, "simplified", true),
            }),
            "dd_fetch_log" => Ok(Self::FetchLog {
                log_id: arg_str(args, "log_id")?,
            }),
            "dd_top_values" => Ok(Self::TopValues {
                query: arg_str(args, "query")?,
                field: opt_str(args, "field", "service"),
                hours: opt_f64(args, "hours", 24.0),
                limit: opt_u32(args, "limit", 10),
            }),
            "dd_rum_sessions" => rum(RumEventType::Session, 48.0),
            "dd_rum_actions" => rum(RumEventType::Action, 24.0),
            "dd_rum_errors" => rum(RumEventType::Error, 24.0),
            "dd_rum_views" => rum(RumEventType::View, 24.0),
            "dd_search_fields" => Ok(Self::SearchFields {
                keyword: arg_str(args, "keyword")?,
                source: opt_source(args),
            }),
            "dd_field_values" => Ok(Self::FieldValues {
                field: arg_str(args, "field")?,
                query: opt_str(args, "query", "*"),
                source: opt_source(args),
                hours: opt_f64(args, "hours", 24.0),
            }),
            other => Err(CallError::UnknownTool(other.to_string())),
        }
    }

    async fn run(self, client: &DatadogClient) -> Result<Value, ClientError> {
        match self {
            Self::SearchLogs {
                query,
                hours,
                limit,
                simplified,
            } => {
                let body = client.list_logs(&query, hours, limit, Profile::List).await?;
                Ok(simplify_if(simplified, body, summary::simplify_logs))
            }
            Self::TraceLogs {
                trace_id,
                hours,
                limit,
                simplified,
            } => {
                let body = client.trace_logs(&trace_id, hours, limit).await?;
                Ok(simplify_if(simplified, body, summary::simplify_logs))
            }
            Self::FetchLog { log_id } => client.fetch_one(&log_id).await,
            Self::TopValues {
                query,
                field,
                hours,
                limit,
            } => {
                client
                    .aggregate(DataSource::Logs, &query, hours, &field, limit)
                    .await
            }
            Self::Rum {
                kind,
                query,
                hours,
                limit,
                simplified,
            } => {
                let body = match kind {
                    RumEventType::Session => client.rum_sessions(&query, hours, limit).await?,
                    RumEventType::Action => client.rum_actions(&query, hours, limit).await?,
                    RumEventType::Error => client.rum_errors(&query, hours, limit).await?,
                    RumEventType::View => client.rum_views(&query, hours, limit).await?,
                    other => client.rum_list(&query, hours, limit, Some(other)).await?,
                };
                Ok(simplify_if(simplified, body, summary::simplify_rum))
            }
            Self::SearchFields { keyword, source } => client.search_fields(&keyword, source).await,
            Self::FieldValues {
                field,
                query,
                source,
                hours,
            } => client.field_values(&field, &query, source, hours).await,
        }
    }
}

fn simplify_if(simplified: bool, body: Value, simplify: fn(&Value) -> Value) -> Value {
    if simplified {
        simplify(&body)
    } else {
        body
    }
}

fn client_failure(e: &ClientError) -> ToolResult {
    let action = if e.is_auth_failure() {
        "Session rejected. Run: dd-cli auth"
    } else if e.is_retryable() {
        "Datadog is unavailable or rate limiting. Retry later"
    } else {
        "Check the query and arguments"
    };
    ToolResult::failed(e.to_string(), action)
}

/// Needs no credential, so it runs before the auth file is required.
async fn auth_status(ctx: &ServerContext) -> ToolResult {
    match status::probe(&ctx.auth_file, &ctx.options).await {
        Ok(s) => ToolResult::ok(json!(s)),
        Err(e) => ToolResult::failed(format!("{e:#}"), status::REAUTH_ACTION),
    }
}

pub(super) async fn execute(
    tool: &str,
    args: &Value,
    ctx: &ServerContext,
) -> Result<ToolResult, CallError> {
    if tool == AUTH_STATUS_TOOL {
        return Ok(auth_status(ctx).await);
    }
    let call = ToolCall::parse(tool, args)?;

    let credential = match credentials::load_from(&ctx.auth_file) {
        Ok(Some(c)) => c,
        Ok(None) => {
            return Ok(ToolResult::failed(
                "Auth not configured",
                format!(
                    "Run: dd-cli auth (tokens stored at {})",
                    ctx.auth_file.display()
                ),
            ))
        }
        Err(e) => return Ok(ToolResult::failed(format!("{e:#}"), status::REAUTH_ACTION)),
    };

    let client = match DatadogClient::with_options(&credential, ctx.options.clone()) {
        Ok(c) => c,
        Err(e) => return Ok(ToolResult::failed(e.to_string(), status::REAUTH_ACTION)),
    };

    Ok(match call.run(&client).await {
        Ok(body) => ToolResult::ok(body),
        Err(e) => {
            tracing::warn!(tool, error = %e, "tool call failed");
            client_failure(&e)
        }
    })
}
