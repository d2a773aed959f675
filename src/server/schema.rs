use serde_json::{json, Value};

pub(super) fn on_tools_list(msg: &Value) -> Value {
    let mut tools = log_tools();
    tools.extend(rum_tools());
    tools.extend(discovery_tools());
    json!({
        "jsonrpc": "2.0",
        "id": msg["id"],
        "result": { "tools": tools },
    })
}

fn hours(default: u32) -> Value {
    json!({ "type": "number", "description": format!("Hours back to search (default: {default})") })
}

fn limit(default: u32) -> Value {
    json!({ "type": "integer", "description": format!("Max results (default: {default})") })
}

fn simplified() -> Value {
    json!({ "type": "boolean", "description": "Return only the display fields (default: true)" })
}

fn source() -> Value {
    json!({
        "type": "string",
        "enum": ["logs", "rum"],
        "description": "Data source (default: logs)",
    })
}

fn log_tools() -> Vec<Value> {
    vec![
        json!({
            "name": "dd_search_logs",
            "description": concat!(
                "Search Datadog backend logs with web UI query syntax, ",
                "e.g. 'service:pricing status:error'"
            ),
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Datadog search query" },
                    "hours": hours(24),
                    "limit": limit(50),
                    "simplified": simplified(),
                },
                "required": ["query"],
            },
        }),
        json!({
            "name": "dd_trace_logs",
            "description": "Every log line for one trace_id, to follow a request across services",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "trace_id": { "type": "string" },
                    "hours": hours(24),
                    "limit": limit(200),
                    "simplified": simplified(),
                },
                "required": ["trace_id"],
            },
        }),
        json!({
            "name": "dd_fetch_log",
            "description": "Full payload of a single log entry; take log_id from dd_search_logs",
            "inputSchema": {
                "type": "object",
                "properties": { "log_id": { "type": "string" } },
                "required": ["log_id"],
            },
        }),
        json!({
            "name": "dd_top_values",
            "description": "Top values of a field across matching logs",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": { "type": "string" },
                    "field": {
                        "type": "string",
                        "description": "Field to aggregate (default: service)",
                    },
                    "hours": hours(24),
                    "limit": limit(10),
                },
                "required": ["query"],
            },
        }),
    ]
}

fn rum_tool(name: &str, description: &str, default_hours: u32) -> Value {
    json!({
        "name": name,
        "description": description,
        "inputSchema": {
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query (user email, customer ID, ...)",
                },
                "hours": hours(default_hours),
                "limit": limit(50),
                "simplified": simplified(),
            },
            "required": ["query"],
        },
    })
}

fn rum_tools() -> Vec<Value> {
    vec![
        rum_tool("dd_rum_sessions", "RUM user sessions", 48),
        rum_tool(
            "dd_rum_actions",
            "RUM user actions (clicks, inputs, navigations)",
            24,
        ),
        rum_tool("dd_rum_errors", "RUM frontend JavaScript errors", 24),
        rum_tool("dd_rum_views", "RUM page views", 24),
    ]
}

fn discovery_tools() -> Vec<Value> {
    vec![
        json!({
            "name": "dd_search_fields",
            "description":
                "Find queryable field names by partial keyword, e.g. 'usr' finds @usr.id",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "keyword": { "type": "string" },
                    "source": source(),
                },
                "required": ["keyword"],
            },
        }),
        json!({
            "name": "dd_field_values",
            "description": "Known values of a field (autocomplete)",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "field": {
                        "type": "string",
                        "description": "Field path, e.g. '@usr.id' or 'service'",
                    },
                    "query": { "type": "string", "description": "Filter query (default: *)" },
                    "source": source(),
                    "hours": hours(24),
                },
                "required": ["field"],
            },
        }),
        json!({
            "name": "dd_auth_status",
            "description": "Check whether session tokens are configured and still accepted",
            "inputSchema": { "type": "object", "properties": {} },
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_tool_once() {
        let resp = on_tools_list(&json!({ "id": 7 }));
        assert_eq!(resp["id"], 7);
        let names: Vec<&str> = resp["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names.len(), 11);
        for expected in [
            "dd_search_logs",
            "dd_trace_logs",
            "dd_fetch_log",
            "dd_top_values",
            "dd_rum_sessions",
            "dd_rum_actions",
            "dd_rum_errors",
            "dd_rum_views",
            "dd_search_fields",
            "dd_field_values",
            "dd_auth_status",
        ] {
            assert!(names.contains(&expected), "{expected} missing");
        }
    }
}
