//! Metric registry shared between the poll loops and the exposition endpoint
//!
//! The registry maps `(metric name, node label)` to the last observed value.
//! Every poll loop owns a disjoint set of labels, so writers never contend on
//! a key; the lock only protects the map itself against concurrent mutation
//! and iteration by the `/metrics` handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::trace;

use crate::collector::encode_points;
use crate::metrics::MetricPoint;

type Key = (&'static str, String);

/// Latest value per `(name, label)`
///
/// Cloning is cheap and yields a handle to the same underlying table.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    values: Arc<RwLock<BTreeMap<Key, f64>>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, replacing whatever was stored for the same key
    pub async fn observe(&self, name: &'static str, label: &str, value: f64) {
        let mut values = self.values.write().await;
        values.insert((name, label.to_string()), value);
    }

    /// Record a batch of points under a single lock acquisition
    pub async fn apply(&self, points: &[MetricPoint]) {
        let mut values = self.values.write().await;
        for point in points {
            values.insert((point.name, point.label.clone()), point.value);
        }
        trace!("applied {} metric points", points.len());
    }

    /// Current value for a key, if it was ever observed
    pub async fn get(&self, name: &'static str, label: &str) -> Option<f64> {
        let values = self.values.read().await;
        values.get(&(name, label.to_string())).copied()
    }

    /// Number of stored points
    pub async fn len(&self) -> usize {
        self.values.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.is_empty()
    }

    /// Ordered copy of every stored point
    pub async fn snapshot(&self) -> Vec<MetricPoint> {
        let values = self.values.read().await;
        values
            .iter()
            .map(|((name, label), value)| MetricPoint::new(*name, label.clone(), *value))
            .collect()
    }

    /// Render all stored points in the Prometheus text exposition format
    pub async fn render(&self) -> prometheus::Result<String> {
        encode_points(self.snapshot().await)
    }
}
