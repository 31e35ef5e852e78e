//! HTTP surface
//!
//! Each scrape of the telemetry path runs one probe and answers with its
//! gauges. A client that disconnects mid-probe drops the handler future,
//! which cancels the exchange and closes its socket.

use crate::config::{Config, ProbeConfig};
use crate::metrics::ProbeMetrics;
use crate::probe::probe;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub telemetry_path: String,
}

impl AppState {
    pub fn new(config: Config, telemetry_path: impl Into<String>) -> Self {
        AppState {
            config: Arc::new(config),
            telemetry_path: telemetry_path.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProbeParams {
    target: Option<String>,
    module: Option<String>,
}

fn bad_request(message: String) -> Response {
    warn!("{}", message);
    (StatusCode::BAD_REQUEST, format!("{}\n", message)).into_response()
}

/// Probe endpoint handler
async fn probe_handler(
    State(state): State<AppState>,
    Query(params): Query<ProbeParams>,
) -> Response {
    let Some(target) = params.target.filter(|t| !t.trim().is_empty()) else {
        return bad_request("Target parameter is missing".to_string());
    };
    let Some(module_name) = params.module.filter(|m| !m.is_empty()) else {
        return bad_request("Module parameter is missing".to_string());
    };
    let Some(module) = state.config.module(&module_name) else {
        return bad_request(format!("Unknown module '{}'", module_name));
    };
    let config = match ProbeConfig::new(target, module) {
        Ok(config) => config,
        Err(e) => return bad_request(format!("module '{}': {}", module_name, e)),
    };

    let outcome = probe(&config).await;
    let body = ProbeMetrics::from_outcome(&outcome).render();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
        .into_response()
}

async fn landing_handler(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n<head><title>RADIUS Exporter</title></head>\n<body>\n\
         <h1>RADIUS Exporter</h1>\n\
         <p><a href=\"{path}?target=127.0.0.1:1812&amp;module=default\">Probe 127.0.0.1:1812 with module default</a></p>\n\
         </body>\n</html>\n",
        path = state.telemetry_path
    ))
}

/// Liveness check handler
async fn live_handler() -> Response {
    (StatusCode::OK, "alive").into_response()
}

/// Build the exporter router
pub fn router(state: AppState) -> Router {
    let telemetry_path = state.telemetry_path.clone();

    Router::new()
        .route("/", get(landing_handler))
        .route(&telemetry_path, get(probe_handler))
        .route("/health/live", get(live_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the exporter on `listener` until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(
        address = %listener.local_addr()?,
        telemetry_path = %state.telemetry_path,
        "Starting exporter HTTP server"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
