//! HTTP exposition endpoint
//!
//! ## Endpoints
//!
//! - `GET /` - Landing page linking to the metrics
//! - `GET /metrics` - Prometheus text exposition of the registry
//! - `GET /health` - Per-node poll status as JSON

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::registry::MetricRegistry;
use crate::status::PollStatusStore;

/// Content type of the Prometheus text format
pub const EXPOSITION_CONTENT_TYPE: &str = prometheus::TEXT_FORMAT;

const LANDING_PAGE: &str = "<html>
<head><title>RabbitMQ Exporter</title></head>
<body>
<h1>RabbitMQ Exporter</h1>
<p><a href='/metrics'>Metrics</a></p>
</body>
</html>
";

/// State shared by every handler
#[derive(Debug, Clone)]
pub struct ServerState {
    pub registry: MetricRegistry,
    pub status: PollStatusStore,
}

pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/", get(landing_page))
        .route("/metrics", get(metrics))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Bind the exposition server and serve it in a background task
///
/// Returns the bound address.
pub async fn spawn_server(addr: SocketAddr, state: ServerState) -> anyhow::Result<SocketAddr> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;

    info!("exposition server listening on {}", addr);

    let app = router(state);
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!("exposition server error: {}", e);
        }
    });

    Ok(addr)
}

async fn landing_page() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

/// GET /metrics
async fn metrics(State(state): State<ServerState>) -> Response {
    match state.registry.render().await {
        Ok(body) => ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            error!("failed to encode metrics: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /health
///
/// Always answers 200; a failing node shows up in its status only.
async fn health(State(state): State<ServerState>) -> Json<Value> {
    let nodes = state.status.all().await;
    let healthy = nodes.values().filter(|s| s.is_healthy()).count();

    Json(json!({
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "healthy_nodes": healthy,
        "nodes": nodes,
    }))
}
