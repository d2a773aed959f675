use serde_json::{json, Value};

use super::list::ListKind;
use super::time::TimeRange;
use super::types::{DataSource, Profile};
use super::{source_query, ClientError, DatadogClient};

const FETCH_ONE_PATH: &str = "/api/v1/logs-analytics/fetch_one";
const AGGREGATE_PATH: &str = "/api/v1/logs-analytics/aggregate";
const FACET_INFO_PATH: &str = "/api/v1/logs-analytics/facet_info";

const AGGREGATE_INTERVAL_MS: u64 = 60_000;

pub fn fetch_one_body(log_id: &str) -> Value {
    json!({
        "fetch_one": {
            "id": log_id,
            "indexes": ["*"],
            "executionInfo": {},
        }
    })
}

/// Count timeseries grouped by `field`, top `limit` groups by count.
pub fn aggregate_body(query: &str, range: TimeRange, field: &str, limit: u32) -> Value {
    json!({
        "aggregate": {
            "compute": [{
                "timeseries": {
                    "metric": "count",
                    "output": "count:count:timeseries",
                    "aggregation": "count",
                    "interval": AGGREGATE_INTERVAL_MS,
                }
            }],
            "time": range,
            "indexes": ["*"],
            "executionInfo": {},
            "search": { "query": query },
            "groupBy": [{
                "field": {
                    "id": field,
                    "output": field,
                    "sort": { "metric": { "id": "count:count", "order": "desc" } },
                    "limit": limit,
                }
            }],
            "calculatedFields": [],
        }
    })
}

pub fn facet_info_body(query: &str, range: TimeRange, facet: &str, limit: u32) -> Value {
    json!({
        "facet_info": {
            "metric": "count",
            "limit": limit,
            "indexes": ["*"],
            "time": range,
            "aggregation": "count",
            "search": { "query": query },
            "termSearch": { "query": "" },
            "path": facet,
            "executionInfo": {},
            "calculatedFields": [],
            "extractions": [],
        }
    })
}

impl DatadogClient {
    pub async fn list_logs(
        &self,
        query: &str,
        hours: f64,
        limit: u32,
        profile: Profile,
    ) -> Result<Value, ClientError> {
        let kind = ListKind::Logs { profile };
        Ok(self.list_page(&kind, query, hours, limit, None).await?.body)
    }

    pub async fn fetch_one(&self, log_id: &str) -> Result<Value, ClientError> {
        let resp = self
            .post(
                FETCH_ONE_PATH,
                &source_query(DataSource::Logs),
                &fetch_one_body(log_id),
            )
            .await?;
        Ok(resp.body)
    }

    /// Top values of `field`, for either logs or RUM.
    pub async fn aggregate(
        &self,
        source: DataSource,
        query: &str,
        hours: f64,
        field: &str,
        limit: u32,
    ) -> Result<Value, ClientError> {
        let body = aggregate_body(query, TimeRange::last_hours(hours), field, limit);
        let resp = self
            .post(AGGREGATE_PATH, &source_query(source), &body)
            .await?;
        Ok(resp.body)
    }

    pub async fn facet_info(
        &self,
        query: &str,
        hours: f64,
        facet: &str,
        limit: u32,
    ) -> Result<Value, ClientError> {
        let body = facet_info_body(query, TimeRange::last_hours(hours), facet, limit);
        let resp = self
            .post(FACET_INFO_PATH, &source_query(DataSource::Logs), &body)
            .await?;
        Ok(resp.body)
    }

    pub async fn trace_logs(
        &self,
        trace_id: &str,
        hours: f64,
        limit: u32,
    ) -> Result<Value, ClientError> {
        self.list_logs(&format!("trace_id:{trace_id}"), hours, limit, Profile::Trace)
            .await
    }

    /// Probe with a tiny list query. A body without `result` counts as a failure.
    pub async fn test_connection(&self) -> bool {
        match self.list_logs("*", 0.01, 1, Profile::List).await {
            Ok(body) => body.get("result").is_some(),
            Err(e) => {
                tracing::debug!(error = %e, "connection probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RANGE: TimeRange = TimeRange { from: 10, to: 20 };

    #[test]
    fn fetch_one_body_carries_id() {
        let body = fetch_one_body("AQAAAYx");
        assert_eq!(body["fetch_one"]["id"], "AQAAAYx");
        assert_eq!(body["fetch_one"]["indexes"], json!(["*"]));
    }

    #[test]
    fn aggregate_groups_by_field() {
        let body = aggregate_body("env:prod", RANGE, "host", 5);
        let agg = &body["aggregate"];
        assert_eq!(agg["compute"][0]["timeseries"]["interval"], 60_000);
        assert_eq!(agg["groupBy"][0]["field"]["id"], "host");
        assert_eq!(agg["groupBy"][0]["field"]["output"], "host");
        assert_eq!(agg["groupBy"][0]["field"]["limit"], 5);
        assert_eq!(
            agg["groupBy"][0]["field"]["sort"]["metric"],
            json!({ "id": "count:count", "order": "desc" })
        );
        assert_eq!(agg["time"]["from"], 10);
    }

    #[test]
    fn facet_info_sets_path_and_limit() {
        let body = facet_info_body("*", RANGE, "status", 50);
        assert_eq!(body["facet_info"]["path"], "status");
        assert_eq!(body["facet_info"]["limit"], 50);
        assert_eq!(body["facet_info"]["termSearch"]["query"], "");
    }
}
