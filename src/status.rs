//! Per-node poll status, read by the health endpoint

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

/// Outcome of the most recent poll cycles of one node
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollStatus {
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub last_error_timestamp: Option<DateTime<Utc>>,
    /// Failed cycles since the last success
    pub consecutive_failures: u64,
}

impl PollStatus {
    /// A node is healthy once it has succeeded and not failed since
    pub fn is_healthy(&self) -> bool {
        self.last_success.is_some() && self.consecutive_failures == 0
    }
}

/// Shared poll status store keyed by node name
#[derive(Debug, Clone, Default)]
pub struct PollStatusStore {
    statuses: Arc<RwLock<BTreeMap<String, PollStatus>>>,
}

impl PollStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a node known before its first cycle finishes
    pub async fn register(&self, node: &str) {
        let mut statuses = self.statuses.write().await;
        statuses.entry(node.to_string()).or_default();
    }

    /// Drop a node, used when the node set is replaced on reload
    pub async fn remove(&self, node: &str) {
        self.statuses.write().await.remove(node);
    }

    pub async fn record_success(&self, node: &str) {
        let mut statuses = self.statuses.write().await;
        let status = statuses.entry(node.to_string()).or_default();
        status.last_success = Some(Utc::now());
        status.consecutive_failures = 0;
    }

    pub async fn record_failure(&self, node: &str, error: String) {
        let mut statuses = self.statuses.write().await;
        let status = statuses.entry(node.to_string()).or_default();
        status.last_error = Some(error);
        status.last_error_timestamp = Some(Utc::now());
        status.consecutive_failures += 1;
    }

    pub async fn get(&self, node: &str) -> Option<PollStatus> {
        self.statuses.read().await.get(node).cloned()
    }

    pub async fn all(&self) -> BTreeMap<String, PollStatus> {
        self.statuses.read().await.clone()
    }
}
