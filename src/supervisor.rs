//! Launches and replaces the per-node pollers
//!
//! The supervisor owns one [`PollerHandle`] per configured node. Starting
//! dispatches every poller without waiting on any of them. Reloading shuts
//! the running pollers down first and only then starts the new set, so two
//! pollers never write the same node concurrently.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_REQUEST_TIMEOUT, NodeConfig, ResolvedNodeConfig};
use crate::fetcher::{ManagementClient, SnapshotSource};
use crate::poller::{FAILURE_COOLDOWN, PollerHandle};
use crate::registry::MetricRegistry;
use crate::status::PollStatusStore;

/// Settings shared by every poller
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollerOptions {
    pub failure_cooldown: Duration,
    pub request_timeout: Duration,
}

impl Default for PollerOptions {
    fn default() -> Self {
        Self {
            failure_cooldown: FAILURE_COOLDOWN,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

pub struct Supervisor {
    registry: MetricRegistry,
    status: PollStatusStore,
    options: PollerOptions,
    /// Shared connection pool for every node
    client: reqwest::Client,
    pollers: Vec<PollerHandle>,
}

impl Supervisor {
    pub fn new(
        registry: MetricRegistry,
        status: PollStatusStore,
        options: PollerOptions,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            registry,
            status,
            options,
            client,
            pollers: vec![],
        })
    }

    /// Start one poller per node
    ///
    /// Each node's interval is its own `req_interval` if set, else
    /// `default_interval`. Only the first entry of a repeated node name is
    /// started. Returns as soon as every poller is spawned.
    pub async fn start(&mut self, nodes: &[NodeConfig], default_interval: &str) {
        for node in nodes {
            if self.pollers.iter().any(|p| p.name == node.name) {
                warn!("node {} is configured more than once, skipping duplicate", node.name);
                continue;
            }

            let resolved = node.resolve(default_interval);
            let source = Arc::new(ManagementClient::with_client(self.client.clone(), &resolved));
            self.spawn_node(resolved, source).await;
        }

        info!("dispatched {} poller(s)", self.pollers.len());
    }

    /// Start a poller for an already resolved node with a custom source
    pub async fn spawn_node(&mut self, node: ResolvedNodeConfig, source: Arc<dyn SnapshotSource>) {
        debug!(
            "starting poller for node {} ({}) every {:?}",
            node.name, node.url, node.interval
        );

        self.status.register(&node.name).await;
        let handle = PollerHandle::spawn(
            node,
            source,
            self.registry.clone(),
            self.status.clone(),
            self.options.failure_cooldown,
        );
        self.pollers.push(handle);
    }

    /// Replace the running pollers with a new node set
    pub async fn reload(&mut self, nodes: &[NodeConfig], default_interval: &str) {
        info!(
            "reloading: stopping {} poller(s), starting {}",
            self.pollers.len(),
            nodes.len()
        );

        let previous: Vec<String> = self.pollers.iter().map(|p| p.name.clone()).collect();
        self.shutdown().await;

        for name in previous {
            if !nodes.iter().any(|n| n.name == name) {
                self.status.remove(&name).await;
            }
        }

        self.start(nodes, default_interval).await;
    }

    /// Stop every poller and wait until they have exited
    pub async fn shutdown(&mut self) {
        let pollers = std::mem::take(&mut self.pollers);
        let results = join_all(pollers.iter().map(|p| p.shutdown())).await;

        for (poller, result) in pollers.iter().zip(results) {
            // a poller that already exited cannot receive the command
            if let Err(e) = result {
                debug!("poller {} was already stopped: {e:#}", poller.name);
            }
        }
    }

    pub fn handles(&self) -> &[PollerHandle] {
        &self.pollers
    }

    pub fn registry(&self) -> &MetricRegistry {
        &self.registry
    }

    pub fn status(&self) -> &PollStatusStore {
        &self.status
    }
}
