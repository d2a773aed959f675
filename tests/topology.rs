mod common;

use dd_cli::client::ServiceTopology;
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn entity(id: &str, service: &str, health: &str) -> Value {
    json!({
        "id": id,
        "type": "apm-entity",
        "attributes": {
            "id_tags": { "service": service },
            "service_health": { "status": health },
            "stats": {
                "requests_per_second": 12.5,
                "latency_avg": 0.02,
                "latency_p95": 0.09,
                "errors_percentage": 1.0
            }
        }
    })
}

fn edge(source: &str, target: &str, operation: &str) -> Value {
    json!({
        "type": "apm-entity-edge",
        "attributes": { "operation": operation, "span.kind": "client" },
        "relationships": {
            "source": { "data": { "id": source } },
            "target": { "data": { "id": target } }
        }
    })
}

/// web -> api -> db -> cache, plus an included health record that is not an entity.
async fn mount_chain(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/unstable/apm/entities"))
        .and(query_param("filter[env]", "prod"))
        .and(query_param("filter[entity.type.catalog.kind]", "service"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                entity("e1", "web", "ok"),
                entity("e2", "api", "warn"),
                entity("e3", "db", "ok"),
                entity("e4", "cache", "ok"),
                { "id": "h1", "type": "service-health" }
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/unstable/apm/entities/graph"))
        .and(query_param("filter[env]", "prod"))
        .and(query_param("datastore", "metrics"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                edge("e1", "e2", "http.request"),
                edge("e2", "e3", "postgres.query"),
                edge("e3", "e4", "redis.command")
            ]
        })))
        .expect(1)
        .mount(server)
        .await;
}

fn names(topology: &ServiceTopology) -> Vec<&str> {
    let mut names: Vec<_> = topology.nodes.iter().map(|n| n.service.as_str()).collect();
    names.sort_unstable();
    names
}

#[tokio::test]
async fn full_graph_resolves_edge_names() {
    let server = MockServer::start().await;
    mount_chain(&server).await;

    let topology = common::client(&server)
        .service_topology("prod", 1.0, None)
        .await
        .unwrap();

    assert_eq!(names(&topology), vec!["api", "cache", "db", "web"]);
    assert_eq!(topology.edges.len(), 3);
    assert_eq!(topology.edges[0].from, "web");
    assert_eq!(topology.edges[0].to, "api");
    assert_eq!(topology.edges[0].span_kind, "client");

    let api = topology.nodes.iter().find(|n| n.service == "api").unwrap();
    assert_eq!(api.health, "warn");
    assert_eq!(api.stats.requests_per_second, json!(12.5));
}

#[tokio::test]
async fn service_filter_keeps_direct_neighbours() {
    let server = MockServer::start().await;
    mount_chain(&server).await;

    let topology = common::client(&server)
        .service_topology("prod", 1.0, Some("api"))
        .await
        .unwrap();

    assert_eq!(names(&topology), vec!["api", "db", "web"]);
    let edges: Vec<_> = topology
        .edges
        .iter()
        .map(|e| (e.from.as_str(), e.to.as_str()))
        .collect();
    assert_eq!(edges, vec![("web", "api"), ("api", "db")]);
}

#[tokio::test]
async fn unknown_service_filter_is_empty() {
    let server = MockServer::start().await;
    mount_chain(&server).await;

    let topology = common::client(&server)
        .service_topology("prod", 1.0, Some("billing"))
        .await
        .unwrap();
    assert!(topology.nodes.is_empty());
    assert!(topology.edges.is_empty());
}

#[tokio::test]
async fn entity_failure_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/unstable/apm/entities"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let err = common::client(&server)
        .service_topology("prod", 1.0, None)
        .await
        .unwrap_err();
    assert!(err.is_auth_failure());
}
