use std::future::Future;

use futures::{Stream, StreamExt};
use serde::Serialize;
use serde_json::Value;

use crate::client::{ClientError, DatadogClient};

pub const NO_ID: &str = "no_id";
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Where full event payloads come from.
pub trait DetailSource: Sync {
    fn fetch_detail(&self, id: &str) -> impl Future<Output = Result<Value, ClientError>> + Send;
}

impl DetailSource for DatadogClient {
    fn fetch_detail(&self, id: &str) -> impl Future<Output = Result<Value, ClientError>> + Send {
        self.fetch_one(id)
    }
}

/// A list event joined with its detail fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HydratedRecord {
    pub list_event: Value,
    pub full_event: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HydratedRecord {
    pub fn is_complete(&self) -> bool {
        self.full_event.is_some() && self.error.is_none()
    }
}

fn usable_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `event.id`, falling back to a top-level `id` when the nested one is missing or empty.
pub fn record_id(record: &Value) -> Option<String> {
    record
        .pointer("/event/id")
        .and_then(usable_id)
        .or_else(|| record.get("id").and_then(usable_id))
}

async fn hydrate_one<S: DetailSource>(source: &S, list_event: Value) -> HydratedRecord {
    let Some(id) = record_id(&list_event) else {
        return HydratedRecord {
            list_event,
            full_event: None,
            error: Some(NO_ID.to_string()),
        };
    };
    match source.fetch_detail(&id).await {
        Ok(full) => HydratedRecord {
            list_event,
            full_event: Some(full),
            error: None,
        },
        Err(e) => {
            tracing::debug!(%id, error = %e, "detail fetch failed");
            HydratedRecord {
                list_event,
                full_event: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Fetch details for every event with at most `concurrency` requests in flight.
///
/// Records come out in completion order. Failures are carried inline.
pub fn hydrate<'a, S: DetailSource>(
    source: &'a S,
    events: Vec<Value>,
    concurrency: usize,
) -> impl Stream<Item = HydratedRecord> + 'a {
    tracing::info!(events = events.len(), concurrency, "hydrating");
    futures::stream::iter(events)
        .map(move |event| hydrate_one(source, event))
        .buffer_unordered(concurrency.max(1))
}
