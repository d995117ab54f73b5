//! Helper functions for integration tests

#![allow(dead_code)]

use std::time::Duration;

use rabbitmq_exporter::config::{NodeConfig, ResolvedNodeConfig};
use rabbitmq_exporter::status::PollStatusStore;
use rabbitmq_exporter::{MetricRegistry, PollerOptions, Supervisor};
use wiremock::matchers::{basic_auth, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const USERNAME: &str = "monitor";
pub const PASSWORD: &str = "s3cret";

pub fn create_node_config(name: &str, url: &str) -> NodeConfig {
    NodeConfig {
        name: name.to_string(),
        url: url.to_string(),
        uname: USERNAME.to_string(),
        password: PASSWORD.to_string(),
        interval: None,
    }
}

pub fn create_resolved_node(name: &str, url: &str) -> ResolvedNodeConfig {
    create_node_config(name, url).resolve("30s")
}

pub fn create_supervisor() -> Supervisor {
    Supervisor::new(
        MetricRegistry::new(),
        PollStatusStore::new(),
        PollerOptions {
            failure_cooldown: Duration::from_secs(10),
            request_timeout: Duration::from_secs(2),
        },
    )
    .unwrap()
}

pub fn create_overview_json(node: &str, connections: u64, published: u64) -> serde_json::Value {
    serde_json::json!({
        "management_version": "3.12.0",
        "cluster_name": "rabbit@test",
        "node": node,
        "object_totals": {
            "channels": 4,
            "connections": connections,
            "consumers": 2,
            "exchanges": 14,
            "queues": 3
        },
        "queue_totals": {
            "messages": 12,
            "messages_details": {"rate": 0.0},
            "messages_ready": 9,
            "messages_ready_details": {"rate": 0.0},
            "messages_unacknowledged": 3,
            "messages_unacknowledged_details": {"rate": 0.0}
        },
        "message_stats": {
            "ack": 80,
            "confirm": 95,
            "deliver": 85,
            "deliver_get": 90,
            "deliver_no_ack": 5,
            "publish": published,
            "publish_details": {"rate": 2.5},
            "redeliver": 1
        }
    })
}

pub fn create_queues_json(node: &str, messages: &[u64]) -> serde_json::Value {
    let queues: Vec<_> = messages
        .iter()
        .enumerate()
        .map(|(i, count)| {
            serde_json::json!({
                "name": format!("queue-{i}"),
                "vhost": "/",
                "node": node,
                "messages": count
            })
        })
        .collect();
    serde_json::Value::Array(queues)
}

/// Start a mock management API answering both endpoints
pub async fn start_mock_broker(
    overview: serde_json::Value,
    queues: serde_json::Value,
) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/overview"))
        .and(basic_auth(USERNAME, PASSWORD))
        .respond_with(ResponseTemplate::new(200).set_body_json(overview))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/queues"))
        .and(basic_auth(USERNAME, PASSWORD))
        .respond_with(ResponseTemplate::new(200).set_body_json(queues))
        .mount(&mock_server)
        .await;

    mock_server
}

/// Start a mock management API that fails every request with `status`
pub async fn start_failing_broker(status: u16) -> MockServer {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(status))
        .mount(&mock_server)
        .await;

    mock_server
}
