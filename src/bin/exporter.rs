use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use clap::Parser;
use rabbitmq_exporter::{
    MetricRegistry, PollerOptions, Supervisor,
    config::{CONFIG_RETRY_COOLDOWN, Config, load_config_with_retry, read_config_file},
    poller::FAILURE_COOLDOWN,
    server::{ServerState, spawn_server},
    status::PollStatusStore,
    util::get_addr,
};
use tracing::{error, info, level_filters::LevelFilter, trace, warn};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file
    #[arg(default_value = "config.json")]
    config: PathBuf,
}

fn init() {
    dotenv::dotenv().ok();

    let filter = filter::Targets::new().with_targets(vec![
        ("rabbitmq_exporter", LevelFilter::DEBUG),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = load_config_with_retry(&args.config, CONFIG_RETRY_COOLDOWN).await;
    let port = config.listen_port()?;

    let registry = MetricRegistry::new();
    let status = PollStatusStore::new();
    let options = PollerOptions {
        failure_cooldown: FAILURE_COOLDOWN,
        request_timeout: config.request_timeout(),
    };

    let mut supervisor = Supervisor::new(registry.clone(), status.clone(), options)?;
    supervisor.start(&config.nodes, &config.interval).await;

    info!("Starting RabbitMQ exporter on port: {port}");
    spawn_server(
        SocketAddr::new(get_addr(), port),
        ServerState { registry, status },
    )
    .await?;

    wait_for_signals(&args.config, &config, &mut supervisor).await?;

    info!("shutting down");
    supervisor.shutdown().await;

    Ok(())
}

/// Re-read the configuration and restart the pollers
///
/// A configuration that fails to load leaves the running pollers alone.
#[cfg_attr(not(unix), allow(dead_code))]
async fn reload(path: &Path, running: &Config, supervisor: &mut Supervisor) {
    let config = match read_config_file(path) {
        Ok(config) => config,
        Err(e) => {
            error!("{}: {e}, keeping the current configuration", path.display());
            return;
        }
    };

    if config.port != running.port {
        warn!("changing the port requires a restart, still serving on {}", running.port);
    }
    if config.request_timeout() != running.request_timeout() {
        warn!("changing the request timeout requires a restart");
    }

    supervisor.reload(&config.nodes, &config.interval).await;
}

#[cfg(unix)]
async fn wait_for_signals(
    path: &Path,
    config: &Config,
    supervisor: &mut Supervisor,
) -> anyhow::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut hangup = signal(SignalKind::hangup())?;
    let mut terminate = signal(SignalKind::terminate())?;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("received CTRL+C");
                break;
            }
            _ = terminate.recv() => {
                info!("received SIGTERM");
                break;
            }
            _ = hangup.recv() => {
                info!("received SIGHUP, reloading {}", path.display());
                reload(path, config, supervisor).await;
            }
        }
    }

    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_signals(
    _path: &Path,
    _config: &Config,
    _supervisor: &mut Supervisor,
) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("received CTRL+C");
    Ok(())
}
