use std::collections::{HashMap, HashSet};

use serde::Serialize;
use serde_json::Value;

use super::time::TimeRange;
use super::{ClientError, DatadogClient};

const ENTITIES_PATH: &str = "/api/unstable/apm/entities";
const GRAPH_PATH: &str = "/api/unstable/apm/entities/graph";

const ENTITY_COLUMNS: &str =
    "SERVICE_NAME,REQUESTS,REQUESTS_PER_SECOND,ERRORS,ERRORS_PERCENTAGE,LATENCY_AVG,LATENCY_P95";
const GRAPH_COLUMNS: &str = "OPERATION_NAME,REQUESTS_PER_SECOND,LATENCY_AVG,ERRORS_PERCENTAGE";
const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceStats {
    pub requests_per_second: Value,
    pub latency_avg: Value,
    pub latency_p95: Value,
    pub errors_percentage: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceNode {
    pub service: String,
    pub health: String,
    pub stats: ServiceStats,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ServiceEdge {
    pub from: String,
    pub to: String,
    pub operation: String,
    pub span_kind: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceTopology {
    pub nodes: Vec<ServiceNode>,
    pub edges: Vec<ServiceEdge>,
}

fn str_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn data_items<'a>(body: &'a Value, kind: &'a str) -> impl Iterator<Item = &'a Value> + 'a {
    body.get("data")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(move |item| item.get("type").and_then(Value::as_str) == Some(kind))
}

/// Nodes from the entity list, plus the entity-id to service-name map used to resolve edges.
pub fn parse_nodes(entities: &Value) -> (Vec<ServiceNode>, HashMap<String, String>) {
    let mut nodes = Vec::new();
    let mut names = HashMap::new();

    for item in data_items(entities, "apm-entity") {
        let service = str_at(item, "/attributes/id_tags/service")
            .unwrap_or(UNKNOWN)
            .to_string();
        if let Some(id) = item.get("id").and_then(Value::as_str) {
            names.insert(id.to_string(), service.clone());
        }

        let stat = |name: &str| {
            item.pointer(&format!("/attributes/stats/{name}"))
                .cloned()
                .unwrap_or(Value::Null)
        };
        nodes.push(ServiceNode {
            health: str_at(item, "/attributes/service_health/status")
                .unwrap_or(UNKNOWN)
                .to_string(),
            stats: ServiceStats {
                requests_per_second: stat("requests_per_second"),
                latency_avg: stat("latency_avg"),
                latency_p95: stat("latency_p95"),
                errors_percentage: stat("errors_percentage"),
            },
            service,
        });
    }
    (nodes, names)
}

/// Edges from the graph response. Ids missing from `names` are kept verbatim.
pub fn parse_edges(graph: &Value, names: &HashMap<String, String>) -> Vec<ServiceEdge> {
    let resolve = |id: &str| names.get(id).cloned().unwrap_or_else(|| id.to_string());

    data_items(graph, "apm-entity-edge")
        .filter_map(|item| {
            let source = str_at(item, "/relationships/source/data/id")?;
            let target = str_at(item, "/relationships/target/data/id")?;
            Some(ServiceEdge {
                from: resolve(source),
                to: resolve(target),
                operation: str_at(item, "/attributes/operation").unwrap_or("").to_string(),
                span_kind: item
                    .get("attributes")
                    .and_then(|a| a.get("span.kind"))
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .to_string(),
            })
        })
        .collect()
}

impl ServiceTopology {
    /// Single-hop neighbourhood of `service`.
    ///
    /// Keeps the service and every direct neighbour, and only the edges whose
    /// two endpoints are both kept.
    pub fn neighborhood(self, service: &str) -> Self {
        let mut keep: HashSet<&str> = HashSet::from([service]);
        for edge in &self.edges {
            if edge.from == service {
                keep.insert(&edge.to);
            } else if edge.to == service {
                keep.insert(&edge.from);
            }
        }
        let keep: HashSet<String> = keep.into_iter().map(str::to_string).collect();

        Self {
            nodes: self
                .nodes
                .into_iter()
                .filter(|n| keep.contains(&n.service))
                .collect(),
            edges: self
                .edges
                .into_iter()
                .filter(|e| keep.contains(&e.from) && keep.contains(&e.to))
                .collect(),
        }
    }
}

fn window(env: &str, range: TimeRange) -> Vec<(&'static str, String)> {
    let (from, to) = range.as_seconds();
    vec![
        ("filter[env]", env.to_string()),
        ("filter[from]", from.to_string()),
        ("filter[to]", to.to_string()),
    ]
}

pub fn entities_query(env: &str, range: TimeRange) -> Vec<(&'static str, String)> {
    let mut q = window(env, range);
    q.extend([
        ("filter[columns]", ENTITY_COLUMNS.to_string()),
        ("filter[entity.type.catalog.kind]", "service".to_string()),
        ("order_by_col", "REQUESTS".to_string()),
        ("order_by_desc", "true".to_string()),
        ("source", "web-ui".to_string()),
        ("page[size]", "1000".to_string()),
        ("page[number]", "0".to_string()),
        ("include", "entity.service_health".to_string()),
    ]);
    q
}

pub fn graph_query(env: &str, range: TimeRange) -> Vec<(&'static str, String)> {
    let mut q = window(env, range);
    q.extend([
        ("filter[columns]", GRAPH_COLUMNS.to_string()),
        ("source", "web-ui".to_string()),
        ("datastore", "metrics".to_string()),
        ("page[size]", "0".to_string()),
        ("return_legacy_fields", "false".to_string()),
        ("include", "entity.service_health".to_string()),
        ("filter[metadata]", "color".to_string()),
        ("graph.hide_service_overrides", "false".to_string()),
    ]);
    q
}

impl DatadogClient {
    pub async fn service_topology(
        &self,
        env: &str,
        hours: f64,
        service: Option<&str>,
    ) -> Result<ServiceTopology, ClientError> {
        let range = TimeRange::last_hours(hours);
        let entities = self.get(ENTITIES_PATH, &entities_query(env, range)).await?;
        let graph = self.get(GRAPH_PATH, &graph_query(env, range)).await?;

        let (nodes, names) = parse_nodes(&entities.body);
        let edges = parse_edges(&graph.body, &names);
        tracing::debug!(nodes = nodes.len(), edges = edges.len(), env, "topology fetched");

        let topology = ServiceTopology { nodes, edges };
        Ok(match service.filter(|s| !s.is_empty()) {
            Some(s) => topology.neighborhood(s),
            None => topology,
        })
    }
}
