use std::path::Path;
use std::time::Duration;

use tracing::{error, info, trace, warn};

use crate::duration::parse_duration;
use crate::error::ConfigError;

/// Poll interval used when a node's interval string cannot be parsed
pub const FALLBACK_INTERVAL: Duration = Duration::from_secs(30);

/// Wait between attempts to load the configuration at startup
pub const CONFIG_RETRY_COOLDOWN: Duration = Duration::from_secs(10);

/// Request timeout applied when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Port the exposition endpoint listens on
    pub port: String,

    /// Default poll interval for nodes without their own
    #[serde(rename = "req_interval", default = "default_interval")]
    pub interval: String,

    /// Timeout for a single management API request
    #[serde(rename = "req_timeout", default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct NodeConfig {
    pub name: String,
    /// Scheme and host of the management API, without a trailing path
    pub url: String,
    pub uname: String,
    pub password: String,
    #[serde(rename = "req_interval", default)]
    pub interval: Option<String>,
}

/// A node with its effective poll interval already decided
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNodeConfig {
    pub name: String,
    pub url: String,
    pub uname: String,
    pub password: String,
    pub interval: Duration,
}

fn default_interval() -> String {
    String::from("30s")
}

impl Config {
    /// Port as a number, validated
    pub fn listen_port(&self) -> Result<u16, ConfigError> {
        self.port
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("port {:?} is not a valid port", self.port)))
    }

    /// Request timeout, falling back to the default if unset or unparsable
    pub fn request_timeout(&self) -> Duration {
        match self.timeout.as_deref() {
            None => DEFAULT_REQUEST_TIMEOUT,
            Some(raw) => match parse_duration(raw) {
                Ok(timeout) if !timeout.is_zero() => timeout,
                Ok(_) => {
                    warn!("request timeout must not be zero, using {DEFAULT_REQUEST_TIMEOUT:?}");
                    DEFAULT_REQUEST_TIMEOUT
                }
                Err(e) => {
                    warn!("{e:#}, using {DEFAULT_REQUEST_TIMEOUT:?} as request timeout");
                    DEFAULT_REQUEST_TIMEOUT
                }
            },
        }
    }
}

impl NodeConfig {
    /// Interval string in effect for this node
    ///
    /// An absent or empty node interval means the global default applies.
    pub fn effective_interval<'a>(&'a self, default: &'a str) -> &'a str {
        match self.interval.as_deref() {
            Some(interval) if !interval.trim().is_empty() => interval,
            _ => default,
        }
    }

    /// Decide the poll interval for this node
    ///
    /// An unparsable or zero interval logs a warning and falls back to
    /// [`FALLBACK_INTERVAL`].
    pub fn resolve(&self, default_interval: &str) -> ResolvedNodeConfig {
        let raw = self.effective_interval(default_interval);
        let interval = match parse_duration(raw) {
            Ok(interval) if !interval.is_zero() => interval,
            Ok(_) => {
                warn!(node = %self.name, "poll interval must not be zero, using {FALLBACK_INTERVAL:?}");
                FALLBACK_INTERVAL
            }
            Err(e) => {
                warn!(node = %self.name, "{e:#}, using {FALLBACK_INTERVAL:?}");
                FALLBACK_INTERVAL
            }
        };

        ResolvedNodeConfig {
            name: self.name.clone(),
            url: self.url.clone(),
            uname: self.uname.clone(),
            password: self.password.clone(),
            interval,
        }
    }
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    let config: Config = serde_json::from_str(&file_content)?;
    config.listen_port()?;
    trace!("loaded config: {config:?}");
    Ok(config)
}

/// Load the configuration, retrying until it succeeds
///
/// Nothing is polled before a configuration is available, so this blocks
/// startup for as long as the file is missing or malformed.
pub async fn load_config_with_retry(path: impl AsRef<Path>, cooldown: Duration) -> Config {
    let path = path.as_ref();
    loop {
        match read_config_file(path) {
            Ok(config) => {
                info!(
                    "loaded configuration from {} with {} node(s)",
                    path.display(),
                    config.nodes.len()
                );
                return config;
            }
            Err(e) => {
                error!("{}: {e}, retrying in {cooldown:?}", path.display());
                tokio::time::sleep(cooldown).await;
            }
        }
    }
}
