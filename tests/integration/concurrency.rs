//! Concurrency tests
//!
//! These tests verify the shared registry under concurrent use:
//! - Many writers with disjoint labels while a reader renders
//! - Many pollers against live mock brokers at once

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rabbitmq_exporter::MetricRegistry;
use rabbitmq_exporter::metrics::{CHANNELS_TOTAL, CONNECTIONS_TOTAL, MESSAGES_TOTAL, MetricPoint};

use crate::helpers::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_and_reader() {
    let registry = MetricRegistry::new();
    let done = Arc::new(AtomicBool::new(false));

    let reader = {
        let registry = registry.clone();
        let done = done.clone();
        tokio::spawn(async move {
            let mut renders = 0usize;
            while !done.load(Ordering::SeqCst) {
                let text = registry.render().await.unwrap();
                // every sample line is complete
                for line in text.lines().filter(|l| !l.starts_with('#')) {
                    assert!(line.contains("{node=\"node-"), "corrupt line: {line}");
                }
                renders += 1;
                tokio::task::yield_now().await;
            }
            renders
        })
    };

    let mut writers = vec![];
    for i in 0..8 {
        let registry = registry.clone();
        writers.push(tokio::spawn(async move {
            let label = format!("node-{i}");
            for round in 0..200 {
                registry
                    .apply(&[
                        MetricPoint::new(CHANNELS_TOTAL, label.clone(), round as f64),
                        MetricPoint::new(CONNECTIONS_TOTAL, label.clone(), i as f64),
                    ])
                    .await;
            }
        }));
    }

    for writer in writers {
        writer.await.unwrap();
    }
    done.store(true, Ordering::SeqCst);
    let renders = reader.await.unwrap();
    assert!(renders >= 1);

    assert_eq!(registry.len().await, 16);
    for i in 0..8 {
        let label = format!("node-{i}");
        assert_eq!(registry.get(CHANNELS_TOTAL, &label).await, Some(199.0));
        assert_eq!(registry.get(CONNECTIONS_TOTAL, &label).await, Some(i as f64));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_pollers_in_parallel() {
    let mut brokers = vec![];
    let mut nodes = vec![];
    for i in 0..5 {
        let node = format!("rabbit@n{i}");
        let broker = start_mock_broker(
            create_overview_json(&node, i, i * 10),
            create_queues_json(&node, &[i, 1]),
        )
        .await;
        nodes.push(create_node_config(&format!("n{i}"), &broker.uri()));
        brokers.push(broker);
    }

    let mut supervisor = create_supervisor();
    supervisor.start(&nodes, "30s").await;

    let mut tasks = vec![];
    for handle in supervisor.handles() {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move { handle.poll_now().await }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let registry = supervisor.registry();
    for i in 0..5u64 {
        let node = format!("rabbit@n{i}");
        assert_eq!(registry.get(CONNECTIONS_TOTAL, &node).await, Some(i as f64));
        assert_eq!(registry.get(MESSAGES_TOTAL, &node).await, Some((i + 1) as f64));
    }

    supervisor.shutdown().await;
}
