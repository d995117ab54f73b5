pub mod collector;
pub mod config;
pub mod duration;
pub mod error;
pub mod fetcher;
pub mod mapper;
pub mod metrics;
pub mod poller;
pub mod registry;
pub mod server;
pub mod status;
pub mod supervisor;
pub mod util;

pub use error::{ConfigError, PollError, PollResult};
pub use metrics::MetricPoint;
pub use registry::MetricRegistry;
pub use supervisor::{PollerOptions, Supervisor};
