use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Which event store a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    #[default]
    Logs,
    Rum,
}

impl DataSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Logs => "logs",
            Self::Rum => "rum",
        }
    }
}

/// RUM sub-kinds, matched against `@type` in the search query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RumEventType {
    Session,
    View,
    Action,
    Resource,
    Error,
    #[value(name = "long_task")]
    LongTask,
}

impl RumEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Session => "session",
            Self::View => "view",
            Self::Action => "action",
            Self::Resource => "resource",
            Self::Error => "error",
            Self::LongTask => "long_task",
        }
    }

    /// Prefix `query` with the `@type:` term for this kind.
    pub fn scope(self, query: &str) -> String {
        format!("@type:{} {query}", self.as_str()).trim().to_string()
    }
}

/// Column sets requested from the log list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    #[default]
    List,
    Trace,
    K8s,
    Minimal,
    Full,
}

impl Profile {
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Self::List => &["timestamp", "service", "host", "status", "content", "trace_id"],
            Self::Trace => &["timestamp", "service", "span_id", "trace_id", "message"],
            Self::K8s => &[
                "timestamp",
                "kube_namespace",
                "pod_name",
                "container_id",
                "message",
            ],
            Self::Minimal => &["timestamp", "service", "content"],
            Self::Full => &[
                "status_line",
                "timestamp",
                "host",
                "service",
                "content",
                "trace_id",
                "span_id",
            ],
        }
    }

    pub fn columns(self) -> Vec<Value> {
        columns(self.fields())
    }
}

pub const RUM_FIELDS: &[&str] = &[
    "timestamp",
    "@type",
    "@session.id",
    "@usr.id",
    "@view.name",
    "@action.name",
    "@error.message",
];

pub fn columns(fields: &[&str]) -> Vec<Value> {
    fields
        .iter()
        .map(|path| json!({ "field": { "path": path } }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_prefixes_type_term() {
        assert_eq!(
            RumEventType::Session.scope("C-13947"),
            "@type:session C-13947"
        );
        assert_eq!(RumEventType::LongTask.scope(""), "@type:long_task");
    }

    #[test]
    fn profile_columns_keep_field_order() {
        let cols = Profile::Trace.columns();
        assert_eq!(cols.len(), 5);
        assert_eq!(cols[0], json!({ "field": { "path": "timestamp" } }));
        assert_eq!(cols[4], json!({ "field": { "path": "message" } }));
    }

    #[test]
    fn data_source_deserializes_lowercase() {
        let ds: DataSource = serde_json::from_value(json!("rum")).unwrap();
        assert_eq!(ds, DataSource::Rum);
        assert_eq!(DataSource::default().as_str(), "logs");
    }

    #[test]
    fn rum_event_type_parses_from_cli_value() {
        use clap::ValueEnum;
        let kind = RumEventType::from_str("long_task", false).unwrap();
        assert_eq!(kind, RumEventType::LongTask);
    }
}
