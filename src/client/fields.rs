use serde_json::{json, Value};

use super::time::TimeRange;
use super::types::DataSource;
use super::{ClientError, DatadogClient};

const FIELD_PATH: &str = "/api/ui/event-platform/query/field";
const FIELD_VALUE_PATH: &str = "/api/ui/event-platform/query/field-value";

pub fn search_fields_body(keyword: &str, source: DataSource) -> Value {
    json!({ "type": source.as_str(), "term": keyword })
}

pub fn field_values_body(field: &str, query: &str, source: DataSource, range: TimeRange) -> Value {
    json!({
        "type": source.as_str(),
        "field": field,
        "search": { "query": query },
        "time": range,
    })
}

impl DatadogClient {
    /// Field names matching a partial keyword, e.g. `usr` finds `@usr.id`.
    pub async fn search_fields(
        &self,
        keyword: &str,
        source: DataSource,
    ) -> Result<Value, ClientError> {
        let resp = self
            .post(FIELD_PATH, &[], &search_fields_body(keyword, source))
            .await?;
        Ok(resp.body)
    }

    pub async fn field_values(
        &self,
        field: &str,
        query: &str,
        source: DataSource,
        hours: f64,
    ) -> Result<Value, ClientError> {
        let body = field_values_body(field, query, source, TimeRange::last_hours(hours));
        let resp = self.post(FIELD_VALUE_PATH, &[], &body).await?;
        Ok(resp.body)
    }
}
