//! Error types for configuration loading and node polling

use std::fmt;

/// Result type alias for a single poll cycle
pub type PollResult<T> = Result<T, PollError>;

/// Errors that can end a poll cycle early
///
/// All variants are node-local: the loop that hit one logs it, waits for the
/// failure cooldown and tries again. Nothing here is allowed to cross into
/// another node's loop.
#[derive(Debug, Clone, PartialEq)]
pub enum PollError {
    /// Transport failure or non-2xx response from the management API
    Fetch(String),

    /// Response body was not JSON, or not the expected JSON shape
    Decode(String),

    /// The queue listing was empty, so there is no node to label the total with
    EmptyQueueList,

    /// The snapshot did not carry a usable `node` field
    MissingNodeLabel,
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollError::Fetch(msg) => write!(f, "failed to fetch snapshot: {}", msg),
            PollError::Decode(msg) => write!(f, "failed to decode snapshot: {}", msg),
            PollError::EmptyQueueList => {
                write!(f, "queue listing is empty, cannot determine node label")
            }
            PollError::MissingNodeLabel => write!(f, "snapshot has no string `node` field"),
        }
    }
}

impl std::error::Error for PollError {}

impl From<reqwest::Error> for PollError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            PollError::Decode(err.to_string())
        } else if err.is_timeout() {
            PollError::Fetch(format!("request timed out: {}", err))
        } else {
            PollError::Fetch(err.to_string())
        }
    }
}

impl From<serde_json::Error> for PollError {
    fn from(err: serde_json::Error) -> Self {
        PollError::Decode(err.to_string())
    }
}

/// Errors that can occur while loading the configuration file
#[derive(Debug)]
pub enum ConfigError {
    /// The file could not be read
    Io(std::io::Error),

    /// The file is not a valid configuration document
    Parse(serde_json::Error),

    /// The document parsed but a value in it is unusable
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read configuration file: {}", err),
            ConfigError::Parse(err) => write!(f, "invalid configuration file: {}", err),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}
