use serde_json::{json, Value};

use super::time::TimeRange;
use super::types::DataSource;
use super::{ClientError, DatadogClient};

const WATCHDOG_PATH: &str = "/api/v2/watchdog/insights/search";
const VIEWS_PATH: &str = "/api/v1/logs/views";

pub fn watchdog_body(query: &str, range: TimeRange, source: DataSource) -> Value {
    json!({
        "filter": {
            "query": query,
            "from": range.from,
            "to": range.to,
        },
        "source": source.as_str(),
    })
}

pub fn views_query(search: &str, source: DataSource, limit: u32) -> Vec<(&'static str, String)> {
    vec![
        ("type", source.as_str().to_string()),
        ("q", search.to_string()),
        ("fullIntegration", "false".to_string()),
        ("limit", limit.to_string()),
        ("filter_by_me", "false".to_string()),
    ]
}

impl DatadogClient {
    /// Watchdog anomaly insights over the lookback window.
    pub async fn watchdog_insights(
        &self,
        query: &str,
        hours: f64,
        source: DataSource,
    ) -> Result<Value, ClientError> {
        let body = watchdog_body(query, TimeRange::last_hours(hours), source);
        Ok(self.post(WATCHDOG_PATH, &[], &body).await?.body)
    }

    pub async fn list_views(
        &self,
        search: &str,
        source: DataSource,
        limit: u32,
    ) -> Result<Value, ClientError> {
        Ok(self
            .get(VIEWS_PATH, &views_query(search, source, limit))
            .await?
            .body)
    }
}
