use serde_json::{json, Value};

use super::time::TimeRange;
use super::types::{columns, DataSource, Profile, RumEventType, RUM_FIELDS};
use super::{source_query, ApiResponse, ClientError, DatadogClient};

pub(crate) const LIST_PATH: &str = "/api/v1/logs-analytics/list";

/// What a list request targets: logs with a column profile, or RUM scoped to an event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Logs { profile: Profile },
    Rum { event_type: Option<RumEventType> },
}

impl ListKind {
    pub fn source(&self) -> DataSource {
        match self {
            Self::Logs { .. } => DataSource::Logs,
            Self::Rum { .. } => DataSource::Rum,
        }
    }

    fn columns(&self) -> Vec<Value> {
        match self {
            Self::Logs { profile } => profile.columns(),
            Self::Rum { .. } => columns(RUM_FIELDS),
        }
    }

    fn search_query(&self, query: &str) -> String {
        match self {
            Self::Rum {
                event_type: Some(kind),
            } => kind.scope(query),
            _ => query.to_string(),
        }
    }
}

pub fn list_body(
    kind: &ListKind,
    query: &str,
    range: TimeRange,
    limit: u32,
    cursor: Option<&str>,
) -> Value {
    let mut list = json!({
        "columns": kind.columns(),
        "sort": { "time": { "order": "desc" } },
        "limit": limit,
        "time": range,
        "search": { "query": kind.search_query(query) },
        "indexes": ["*"],
        "includeEvents": true,
        "computeCount": false,
        "executionInfo": {},
    });
    if let Some(cursor) = cursor.filter(|c| !c.is_empty()) {
        list["startAt"] = Value::String(cursor.to_string());
    }
    json!({ "list": list })
}

/// Events of a list response (`result.events`), empty when absent.
pub fn events(body: &Value) -> &[Value] {
    body.pointer("/result/events")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

impl DatadogClient {
    /// One page of a list query. The raw response is returned so callers can read the cursor.
    pub async fn list_page(
        &self,
        kind: &ListKind,
        query: &str,
        hours: f64,
        limit: u32,
        cursor: Option<&str>,
    ) -> Result<ApiResponse, ClientError> {
        let body = list_body(kind, query, TimeRange::last_hours(hours), limit, cursor);
        self.post(LIST_PATH, &source_query(kind.source()), &body)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: TimeRange = TimeRange { from: 1_000, to: 2_000 };

    #[test]
    fn logs_body_uses_profile_columns() {
        let body = list_body(
            &ListKind::Logs {
                profile: Profile::Minimal,
            },
            "service:web",
            RANGE,
            25,
            None,
        );
        let list = &body["list"];
        assert_eq!(list["columns"].as_array().unwrap().len(), 3);
        assert_eq!(list["limit"], 25);
        assert_eq!(list["time"], json!({ "from": 1_000, "to": 2_000 }));
        assert_eq!(list["search"]["query"], "service:web");
        assert_eq!(list["indexes"], json!(["*"]));
        assert_eq!(list["sort"], json!({ "time": { "order": "desc" } }));
        assert_eq!(list["includeEvents"], true);
        assert_eq!(list["computeCount"], false);
        assert!(list.get("startAt").is_none());
    }

    #[test]
    fn cursor_is_sent_as_start_at() {
        let body = list_body(
            &ListKind::Logs {
                profile: Profile::List,
            },
            "*",
            RANGE,
            100,
            Some("AQAAAY"),
        );
        assert_eq!(body["list"]["startAt"], "AQAAAY");
    }

    #[test]
    fn rum_body_scopes_query_and_uses_rum_columns() {
        let body = list_body(
            &ListKind::Rum {
                event_type: Some(RumEventType::Action),
            },
            "@usr.email:a@b.c",
            RANGE,
            50,
            None,
        );
        let list = &body["list"];
        assert_eq!(list["search"]["query"], "@type:action @usr.email:a@b.c");
        assert_eq!(list["columns"][1], json!({ "field": { "path": "@type" } }));
        assert_eq!(list["columns"].as_array().unwrap().len(), RUM_FIELDS.len());
    }

    #[test]
    fn rum_without_kind_keeps_query() {
        let body = list_body(&ListKind::Rum { event_type: None }, "env:prod", RANGE, 10, None);
        assert_eq!(body["list"]["search"]["query"], "env:prod");
    }

    #[test]
    fn events_defaults_to_empty() {
        assert!(events(&json!({})).is_empty());
        assert!(events(&json!({ "result": { "events": null } })).is_empty());
        assert_eq!(events(&json!({ "result": { "events": [1, 2] } })).len(), 2);
    }
}
