//! Snapshot fetcher for the RabbitMQ management HTTP API
//!
//! Each call performs exactly one authenticated GET and decodes the body into
//! a generic [`serde_json::Value`]. There is no retry here; the poll loop
//! decides what happens after a failure.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{instrument, trace};

use crate::config::ResolvedNodeConfig;
use crate::error::{PollError, PollResult};

pub const OVERVIEW_PATH: &str = "/api/overview";
pub const QUEUES_PATH: &str = "/api/queues";

/// Source of broker snapshots for one node
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Cluster overview, always a JSON object
    async fn overview(&self) -> PollResult<Value>;

    /// Queue listing, always a JSON array
    async fn queues(&self) -> PollResult<Value>;
}

/// HTTP client for one node's management API
#[derive(Debug, Clone)]
pub struct ManagementClient {
    client: reqwest::Client,
    base_url: String,
    username: String,
    password: String,
}

impl ManagementClient {
    /// Create a client for a node with the given request timeout
    pub fn new(node: &ResolvedNodeConfig, timeout: Duration) -> PollResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PollError::Fetch(format!("failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, node))
    }

    /// Create a client sharing an existing connection pool
    pub fn with_client(client: reqwest::Client, node: &ResolvedNodeConfig) -> Self {
        Self {
            client,
            base_url: node.url.trim_end_matches('/').to_string(),
            username: node.uname.clone(),
            password: node.password.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `base_url + path` and decode the body as JSON
    #[instrument(skip(self), fields(url = %self.base_url))]
    pub async fn fetch(&self, path: &str) -> PollResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        trace!("requesting {url}");

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PollError::Fetch(format!("{url} returned HTTP {status}")));
        }

        let body = response.bytes().await?;
        let value = serde_json::from_slice(&body)?;

        trace!("decoded response from {url}");
        Ok(value)
    }
}

#[async_trait]
impl SnapshotSource for ManagementClient {
    async fn overview(&self) -> PollResult<Value> {
        let value = self.fetch(OVERVIEW_PATH).await?;
        if !value.is_object() {
            return Err(PollError::Decode(format!(
                "{OVERVIEW_PATH} returned {}, expected an object",
                json_type(&value)
            )));
        }
        Ok(value)
    }

    async fn queues(&self) -> PollResult<Value> {
        let value = self.fetch(QUEUES_PATH).await?;
        if !value.is_array() {
            return Err(PollError::Decode(format!(
                "{QUEUES_PATH} returned {}, expected an array",
                json_type(&value)
            )));
        }
        Ok(value)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
