use serde_json::{json, Value};

use crate::client::list;

const MAX_MESSAGE_CHARS: usize = 500;

fn field(event: &Value, key: &str) -> Value {
    event.get(key).cloned().unwrap_or(Value::Null)
}

fn truncated_message(event: &Value) -> Value {
    let message = event.get("message").and_then(Value::as_str).unwrap_or("");
    Value::String(message.chars().take(MAX_MESSAGE_CHARS).collect())
}

fn wrap(events: Vec<Value>) -> Value {
    json!({ "count": events.len(), "events": events })
}

/// Reduce a log list response to the fields worth showing.
pub fn simplify_logs(body: &Value) -> Value {
    let events = list::events(body)
        .iter()
        .map(|record| {
            let event = record.get("event").unwrap_or(&Value::Null);
            json!({
                "timestamp": field(event, "timestamp"),
                "service": field(event, "service"),
                "status": field(event, "status"),
                "message": truncated_message(event),
                "trace_id": field(event, "trace_id"),
                "id": field(event, "id"),
            })
        })
        .collect();
    wrap(events)
}

pub fn simplify_rum(body: &Value) -> Value {
    let events = list::events(body)
        .iter()
        .map(|record| {
            let event = record.get("event").unwrap_or(&Value::Null);
            json!({
                "timestamp": field(event, "timestamp"),
                "type": field(event, "@type"),
                "session_id": field(event, "@session.id"),
                "user_id": field(event, "@usr.id"),
                "view_name": field(event, "@view.name"),
                "action_name": field(event, "@action.name"),
                "error_message": field(event, "@error.message"),
            })
        })
        .collect();
    wrap(events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_keep_display_fields_and_truncate_message() {
        let body = json!({ "result": { "events": [
            { "id": "outer", "event": {
                "id": "e1", "timestamp": "2024-01-01T00:00:00Z", "service": "api",
                "status": "error", "message": "x".repeat(800), "trace_id": "t1", "host": "h",
            }},
            { "event": { "service": "worker" } },
        ]}});
        let out = simplify_logs(&body);
        assert_eq!(out["count"], 2);
        assert_eq!(out["events"][0]["id"], "e1");
        assert_eq!(out["events"][0]["message"].as_str().unwrap().len(), 500);
        assert!(out["events"][0].get("host").is_none());
        assert_eq!(out["events"][1]["message"], "");
        assert_eq!(out["events"][1]["trace_id"], Value::Null);
    }

    #[test]
    fn rum_maps_at_fields() {
        let body = json!({ "result": { "events": [
            { "event": { "@type": "action", "@session.id": "s1", "@action.name": "click" } },
        ]}});
        let out = simplify_rum(&body);
        assert_eq!(out["count"], 1);
        assert_eq!(out["events"][0]["type"], "action");
        assert_eq!(out["events"][0]["session_id"], "s1");
        assert_eq!(out["events"][0]["action_name"], "click");
        assert_eq!(out["events"][0]["user_id"], Value::Null);
    }

    #[test]
    fn missing_result_is_empty() {
        assert_eq!(simplify_logs(&json!({})), json!({ "count": 0, "events": [] }));
    }
}
