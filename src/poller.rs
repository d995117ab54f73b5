//! NodePoller - Polls one broker node's management API
//!
//! Each configured node gets its own poller actor running as an independent
//! tokio task. Pollers never talk to each other; the only shared state is the
//! metric registry (disjoint label space per node) and the poll status store.
//!
//! ## Cycle
//!
//! ```text
//! Overview → Queues → Sleeping(interval) → Overview …
//!     │         │
//!     └─────────┴──── error ──→ Sleeping(failure cooldown) → Overview …
//!
//! Commands (PollNow, Shutdown) are served between cycles.
//! ```
//!
//! Each step fetches, maps and applies its own points. A failed queue step
//! keeps the overview points of the same cycle. A failure never stops the loop.
//! The cooldown after a failure is a fixed duration; it does not grow.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, sleep};
use tracing::{debug, error, instrument, trace, warn};

use crate::config::ResolvedNodeConfig;
use crate::error::PollResult;
use crate::fetcher::SnapshotSource;
use crate::mapper::{map_overview, map_queue_messages};
use crate::registry::MetricRegistry;
use crate::status::PollStatusStore;

/// Wait before retrying a node whose last cycle failed
pub const FAILURE_COOLDOWN: Duration = Duration::from_secs(10);

/// Commands that can be sent to a [`NodePoller`]
#[derive(Debug)]
pub enum PollerCommand {
    /// Run one cycle immediately, without touching the schedule
    PollNow {
        /// Channel to send the cycle result back
        respond_to: oneshot::Sender<PollResult<()>>,
    },

    /// Stop the poller after any in-flight cycle
    Shutdown,
}

/// Actor that polls a single broker node
pub struct NodePoller {
    node: ResolvedNodeConfig,

    source: Arc<dyn SnapshotSource>,

    registry: MetricRegistry,

    status: PollStatusStore,

    command_rx: mpsc::Receiver<PollerCommand>,

    failure_cooldown: Duration,
}

impl NodePoller {
    pub fn new(
        node: ResolvedNodeConfig,
        source: Arc<dyn SnapshotSource>,
        registry: MetricRegistry,
        status: PollStatusStore,
        command_rx: mpsc::Receiver<PollerCommand>,
        failure_cooldown: Duration,
    ) -> Self {
        Self {
            node,
            source,
            registry,
            status,
            command_rx,
            failure_cooldown,
        }
    }

    /// Run the poll loop
    ///
    /// The first cycle starts immediately. The loop only ends on a Shutdown
    /// command or when every handle has been dropped.
    #[instrument(skip(self), fields(node = %self.node.name))]
    pub async fn run(mut self) {
        debug!(
            "starting poller for {} with interval {:?}",
            self.node.url, self.node.interval
        );

        let next_cycle = sleep(Duration::ZERO);
        tokio::pin!(next_cycle);

        loop {
            tokio::select! {
                _ = &mut next_cycle => {
                    let delay = match self.cycle().await {
                        Ok(()) => self.node.interval,
                        Err(_) => self.failure_cooldown,
                    };
                    trace!("next cycle in {delay:?}");
                    next_cycle.as_mut().reset(Instant::now() + delay);
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(PollerCommand::PollNow { respond_to }) => {
                            debug!("received PollNow command");
                            let result = self.cycle().await;
                            let _ = respond_to.send(result);
                        }

                        Some(PollerCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("command channel closed, shutting down");
                            break;
                        }
                    }
                }
            }
        }

        debug!("poller stopped");
    }

    /// One poll cycle including logging and status bookkeeping
    async fn cycle(&self) -> PollResult<()> {
        match self.poll_once().await {
            Ok(applied) => {
                trace!("applied {applied} metric points");
                self.status.record_success(&self.node.name).await;
                Ok(())
            }
            Err(e) => {
                error!("poll failed: {e}");
                self.status.record_failure(&self.node.name, e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Apply the overview, then the queue total
    ///
    /// The overview points are kept even when the queue step fails
    /// afterwards; the cycle still counts as failed.
    async fn poll_once(&self) -> PollResult<usize> {
        let overview = self.source.overview().await?;
        let points = map_overview(&overview)?;
        self.registry.apply(&points).await;

        let queues = self.source.queues().await?;
        let total = map_queue_messages(&queues)?;
        self.registry.apply(std::slice::from_ref(&total)).await;

        Ok(points.len() + 1)
    }
}

/// Handle for controlling a [`NodePoller`]
///
/// Cloning the handle is cheap; the poller stops once every clone is dropped.
#[derive(Clone)]
pub struct PollerHandle {
    sender: mpsc::Sender<PollerCommand>,

    /// Configured node name
    pub name: String,

    /// Effective poll interval
    pub interval: Duration,
}

impl PollerHandle {
    /// Spawn a poller actor for a node and return its handle
    pub fn spawn(
        node: ResolvedNodeConfig,
        source: Arc<dyn SnapshotSource>,
        registry: MetricRegistry,
        status: PollStatusStore,
        failure_cooldown: Duration,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let name = node.name.clone();
        let interval = node.interval;

        let poller = NodePoller::new(node, source, registry, status, cmd_rx, failure_cooldown);
        tokio::spawn(poller.run());

        Self {
            sender: cmd_tx,
            name,
            interval,
        }
    }

    /// Run a cycle right now and wait for its result
    pub async fn poll_now(&self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(PollerCommand::PollNow { respond_to: tx })
            .await
            .context("failed to send PollNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    /// Ask the poller to stop and wait until it has
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(PollerCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        self.sender.closed().await;
        Ok(())
    }

    /// Whether the poller task has exited
    pub fn is_stopped(&self) -> bool {
        self.sender.is_closed()
    }
}
