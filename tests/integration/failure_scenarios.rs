//! Failure tests for the pollers
//!
//! These tests verify that a broken node stays contained:
//! - Network failures
//! - HTTP errors and rejected credentials
//! - Malformed or empty snapshots

use rabbitmq_exporter::metrics::{CHANNELS_TOTAL, CONNECTIONS_TOTAL, MESSAGES_TOTAL};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::helpers::*;

#[tokio::test]
async fn test_failing_node_does_not_affect_healthy_node() {
    let broken = start_failing_broker(500).await;
    let healthy = start_mock_broker(
        create_overview_json("rabbit@y", 9, 1),
        create_queues_json("rabbit@y", &[1]),
    )
    .await;

    let mut supervisor = create_supervisor();
    supervisor
        .start(
            &[
                create_node_config("x", &broken.uri()),
                create_node_config("y", &healthy.uri()),
            ],
            "30s",
        )
        .await;

    let x = supervisor.handles()[0].clone();
    let y = supervisor.handles()[1].clone();

    assert!(x.poll_now().await.is_err(), "poll should fail for 500 error");
    y.poll_now().await.unwrap();

    let registry = supervisor.registry();
    assert_eq!(registry.get(CONNECTIONS_TOTAL, "rabbit@y").await, Some(9.0));
    assert!(
        registry.snapshot().await.iter().all(|p| p.label == "rabbit@y"),
        "nothing should be recorded for the failing node"
    );

    let status = supervisor.status();
    assert!(status.get("y").await.unwrap().is_healthy());
    assert!(status.get("x").await.unwrap().consecutive_failures >= 1);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_unreachable_node() {
    let mut supervisor = create_supervisor();
    supervisor
        .start(&[create_node_config("gone", "http://127.0.0.1:9")], "30s")
        .await;

    let handle = &supervisor.handles()[0];
    assert!(handle.poll_now().await.is_err());
    // still running, ready for the next cycle
    assert!(!handle.is_stopped());

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_wrong_credentials() {
    let broker = start_mock_broker(
        create_overview_json("rabbit@a", 1, 1),
        create_queues_json("rabbit@a", &[1]),
    )
    .await;

    let mut node = create_node_config("a", &broker.uri());
    node.password = "wrong".to_string();

    let mut supervisor = create_supervisor();
    supervisor.start(&[node], "30s").await;

    assert!(supervisor.handles()[0].poll_now().await.is_err());
    assert!(supervisor.registry().is_empty().await);

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_malformed_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{invalid json"))
        .mount(&mock_server)
        .await;

    let mut supervisor = create_supervisor();
    supervisor
        .start(&[create_node_config("a", &mock_server.uri())], "30s")
        .await;

    let result = supervisor.handles()[0].poll_now().await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("decode"), "unexpected error: {message}");

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_empty_queue_list_fails_cycle() {
    let broker = start_mock_broker(
        create_overview_json("rabbit@a", 1, 1),
        serde_json::json!([]),
    )
    .await;

    let mut supervisor = create_supervisor();
    supervisor
        .start(&[create_node_config("a", &broker.uri())], "30s")
        .await;

    let result = supervisor.handles()[0].poll_now().await;
    let message = format!("{:#}", result.unwrap_err());
    assert!(message.contains("queue listing is empty"), "unexpected error: {message}");

    // the overview of the failed cycle is still exported
    let registry = supervisor.registry();
    assert_eq!(registry.get(CONNECTIONS_TOTAL, "rabbit@a").await, Some(1.0));
    assert!(registry.get(CHANNELS_TOTAL, "rabbit@a").await.is_some());
    assert_eq!(registry.get(MESSAGES_TOTAL, "rabbit@a").await, None);

    let status = supervisor.status().get("a").await.unwrap();
    assert!(!status.is_healthy());
    assert!(status.last_error.unwrap().contains("queue listing is empty"));
    assert!(!supervisor.handles()[0].is_stopped());

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_overview_missing_groups_is_tolerated() {
    let broker = start_mock_broker(
        serde_json::json!({
            "node": "rabbit@fresh",
            "object_totals": {"channels": 0, "connections": 0}
        }),
        create_queues_json("rabbit@fresh", &[0]),
    )
    .await;

    let mut supervisor = create_supervisor();
    supervisor
        .start(&[create_node_config("fresh", &broker.uri())], "30s")
        .await;
    supervisor.handles()[0].poll_now().await.unwrap();

    let registry = supervisor.registry();
    assert_eq!(registry.len().await, 3);
    assert_eq!(registry.get(MESSAGES_TOTAL, "rabbit@fresh").await, Some(0.0));

    supervisor.shutdown().await;
}

#[tokio::test]
async fn test_broker_recovers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .with_priority(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/overview"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_overview_json("rabbit@a", 2, 2)),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/queues"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(create_queues_json("rabbit@a", &[4])),
        )
        .mount(&mock_server)
        .await;

    let mut supervisor = create_supervisor();
    supervisor
        .start(&[create_node_config("a", &mock_server.uri())], "30s")
        .await;
    let handle = supervisor.handles()[0].clone();

    // keep polling until the two failing responses are used up
    let mut recovered = false;
    for _ in 0..4 {
        if handle.poll_now().await.is_ok() {
            recovered = true;
            break;
        }
    }

    assert!(recovered, "poller should recover once the broker answers");
    assert_eq!(
        supervisor.registry().get(MESSAGES_TOTAL, "rabbit@a").await,
        Some(4.0)
    );

    supervisor.shutdown().await;
}
