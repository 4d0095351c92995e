//! # HTTP Server
//!
//! Axum routes wrapping the scrape pipeline.
//!
//! Provides endpoints:
//! - `/api/scrape/{ns}` - Sanitized snapshot of one namespace (`*` for all)
//! - `/api/namespaces` - Namespaces in the cluster
//! - `/api/config` - Namespace scope the frontend should use
//! - `/api/status` - Build and host information
//! - `/api/healthz` - 204 when healthy, 503 otherwise
//! - `/metrics` - Prometheus metrics in text format

use axum::{
    extract::{ConnectInfo, Path, Request, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::Namespace;
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::cluster::{ClusterReader, NamespaceSelector};
use crate::observability::metrics;
use crate::scrape::aggregator::json_response;
use crate::scrape::{ScrapeError, ScrapePipeline, ScrapeResponse};
use crate::status::{HealthFlag, StatusReport};

/// Shared, read-only request state
pub struct AppState<R> {
    pub pipeline: Arc<ScrapePipeline<R>>,
    pub health: Arc<HealthFlag>,
    pub namespace_scope: Arc<str>,
    pub started_at: DateTime<Utc>,
}

impl<R> AppState<R> {
    pub fn new(
        pipeline: ScrapePipeline<R>,
        health: Arc<HealthFlag>,
        namespace_scope: &str,
    ) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            health,
            namespace_scope: Arc::from(namespace_scope),
            started_at: Utc::now(),
        }
    }
}

impl<R> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            pipeline: Arc::clone(&self.pipeline),
            health: Arc::clone(&self.health),
            namespace_scope: Arc::clone(&self.namespace_scope),
            started_at: self.started_at,
        }
    }
}

impl<R> fmt::Debug for AppState<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("healthy", &self.health.is_healthy())
            .field("namespace_scope", &self.namespace_scope)
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}

pub fn router<R: ClusterReader + 'static>(state: AppState<R>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET]);

    Router::new()
        .route("/api/scrape", get(scrape_all_handler::<R>))
        .route("/api/scrape/{ns}", get(scrape_handler::<R>))
        .route("/api/namespaces", get(namespaces_handler::<R>))
        .route("/api/config", get(config_handler::<R>))
        .route("/api/status", get(status_handler::<R>))
        .route("/api/healthz", get(healthz_handler::<R>))
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}

/// Serve until SIGINT / SIGTERM
pub async fn start_server<R: ClusterReader + 'static>(
    port: u16,
    state: AppState<R>,
) -> Result<(), anyhow::Error> {
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

async fn scrape_handler<R: ClusterReader + 'static>(
    State(state): State<AppState<R>>,
    Path(ns): Path<String>,
) -> Result<ScrapeResponse, ScrapeError> {
    state.pipeline.run(&NamespaceSelector::parse(&ns)).await
}

async fn scrape_all_handler<R: ClusterReader + 'static>(
    State(state): State<AppState<R>>,
) -> Result<ScrapeResponse, ScrapeError> {
    state.pipeline.run(&NamespaceSelector::All).await
}

async fn namespaces_handler<R: ClusterReader + 'static>(
    State(state): State<AppState<R>>,
) -> Response {
    let namespaces = match state.pipeline.reader().list_cluster::<Namespace>().await {
        Ok(namespaces) => namespaces,
        Err(e) => {
            error!("Kubernetes API list failed: namespaces: {:#}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}")).into_response();
        }
    };

    match serde_json::to_vec(&namespaces) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(e) => ScrapeError::Serialization(e).into_response(),
    }
}

async fn config_handler<R: ClusterReader + 'static>(State(state): State<AppState<R>>) -> Response {
    let body = json!({ "NamespaceScope": &*state.namespace_scope });
    json_response(StatusCode::OK, body.to_string().into_bytes())
}

async fn status_handler<R: ClusterReader + 'static>(
    State(state): State<AppState<R>>,
    request: Request,
) -> Response {
    // ConnectInfo is only present when served through `start_server`
    let client_address = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_string(), |info| info.0.to_string());
    let server_host = request
        .headers()
        .get(header::HOST)
        .and_then(|host| host.to_str().ok())
        .unwrap_or_default()
        .to_string();

    let report = StatusReport::collect(
        state.health.is_healthy(),
        state.started_at,
        client_address,
        server_host,
    );
    match serde_json::to_vec(&report) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(e) => {
            error!("Failed to get status: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to get status").into_response()
        }
    }
}

async fn healthz_handler<R: ClusterReader + 'static>(
    State(state): State<AppState<R>>,
) -> StatusCode {
    if state.health.is_healthy() {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = metrics::gather();

    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [(header::CONTENT_TYPE, "text/plain")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}
