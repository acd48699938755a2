//! HTTP exporter for generation progress and Prometheus metrics.
//!
//! The generating thread publishes a [`MetricsSnapshot`] after every
//! batch; handlers only ever read the latest one.
//!
//! | Route       | Body                                          |
//! |-------------|-----------------------------------------------|
//! | `/metrics`  | Prometheus text format                        |
//! | `/progress` | `{generated, total, percent, phase, complete}` |
//! | `/status`   | the full snapshot as JSON                     |
//! | `/health`   | loader phase as plain text                    |

use crate::loader::LoaderPhase;
use crate::metrics::{MetricsError, MetricsRegistry, MetricsSnapshot};
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Handle shared between the publisher and the request handlers.
pub type SharedState = Arc<RwLock<MetricsState>>;

/// Errors from running the exporter.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind exporter: {0}")]
    Bind(#[from] std::io::Error),

    #[error("exporter stopped: {0}")]
    Server(String),
}

/// Exporter listen address.
#[derive(Debug, Clone)]
pub struct MetricsServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
}

impl Default for MetricsServerConfig {
    fn default() -> Self {
        Self::with_port(9090)
    }
}

impl MetricsServerConfig {
    /// Listens on all interfaces at `port`.
    pub fn with_port(port: u16) -> Self {
        Self {
            bind_addr: ([0, 0, 0, 0], port).into(),
        }
    }
}

/// Latest published engine state plus the registry fed from it.
pub struct MetricsState {
    registry: MetricsRegistry,
    latest: MetricsSnapshot,
    updates: u64,
}

impl MetricsState {
    /// Wraps a registry with no snapshot published yet.
    pub fn new(registry: MetricsRegistry) -> Self {
        Self {
            registry,
            latest: MetricsSnapshot::default(),
            updates: 0,
        }
    }

    /// Records a new snapshot and advances the registry from it.
    pub fn update(&mut self, snapshot: MetricsSnapshot) {
        self.registry.update(&snapshot);
        self.latest = snapshot;
        self.updates += 1;
    }

    /// The most recently published snapshot.
    pub fn latest(&self) -> &MetricsSnapshot {
        &self.latest
    }

    /// Number of snapshots published so far.
    pub fn updates(&self) -> u64 {
        self.updates
    }

    /// Encodes the registry in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        self.registry.encode()
    }

    fn progress_body(&self) -> ProgressBody {
        let progress = self.latest.progress();
        ProgressBody {
            generated: progress.generated,
            total: progress.total,
            percent: progress.percent(),
            phase: self.latest.loader_phase,
            complete: self.latest.loader_phase == LoaderPhase::Complete,
        }
    }
}

/// JSON body of `/progress`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressBody {
    /// Records produced so far.
    pub generated: usize,
    /// Records to produce in total.
    pub total: usize,
    /// Share produced, 0 to 100.
    pub percent: f64,
    /// Loader phase.
    pub phase: LoaderPhase,
    /// Whether every record has been produced.
    pub complete: bool,
}

/// Progress and metrics exporter.
pub struct MetricsServer {
    config: MetricsServerConfig,
    state: SharedState,
}

impl MetricsServer {
    /// Creates an exporter over `registry`.
    pub fn new(config: MetricsServerConfig, registry: MetricsRegistry) -> Self {
        Self {
            config,
            state: Arc::new(RwLock::new(MetricsState::new(registry))),
        }
    }

    /// Handle the generating side publishes snapshots through.
    pub fn state(&self) -> SharedState {
        Arc::clone(&self.state)
    }

    /// Serves until the listener fails.
    pub async fn run(self) -> Result<(), ServerError> {
        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;
        tracing::info!(addr = %self.config.bind_addr, "Exporter listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| ServerError::Server(e.to_string()))
    }
}

fn router(state: SharedState) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/progress", get(progress_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn metrics_handler(State(state): State<SharedState>) -> Response {
    match state.read().await.encode() {
        Ok(body) => ([(header::CONTENT_TYPE, PROMETHEUS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::warn!("Metrics encoding failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

async fn progress_handler(State(state): State<SharedState>) -> Json<ProgressBody> {
    Json(state.read().await.progress_body())
}

async fn status_handler(State(state): State<SharedState>) -> Json<MetricsSnapshot> {
    Json(state.read().await.latest().clone())
}

async fn health_handler(State(state): State<SharedState>) -> (StatusCode, String) {
    let phase = state.read().await.latest().loader_phase;
    (StatusCode::OK, format!("{:?}", phase))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::CategoryDistribution;

    fn shared() -> SharedState {
        MetricsServer::new(MetricsServerConfig::with_port(0), MetricsRegistry::new().unwrap())
            .state()
    }

    fn snapshot(generated: u64, phase: LoaderPhase) -> MetricsSnapshot {
        MetricsSnapshot {
            records_generated: generated,
            records_target: 200,
            loader_phase: phase,
            background_active: phase == LoaderPhase::BackgroundFill,
            distribution: CategoryDistribution {
                normal: generated as usize,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_config_port() {
        assert_eq!(MetricsServerConfig::default().bind_addr.port(), 9090);
        assert_eq!(MetricsServerConfig::with_port(8080).bind_addr.port(), 8080);
    }

    #[tokio::test]
    async fn test_progress_before_first_snapshot() {
        let state = shared();
        let Json(body) = progress_handler(State(Arc::clone(&state))).await;

        assert_eq!(body.generated, 0);
        assert_eq!(body.total, 0);
        assert_eq!(body.phase, LoaderPhase::Idle);
        assert!(!body.complete);
        assert_eq!(state.read().await.updates(), 0);
    }

    #[tokio::test]
    async fn test_progress_follows_latest_snapshot() {
        let state = shared();
        state.write().await.update(snapshot(50, LoaderPhase::BackgroundFill));
        state.write().await.update(snapshot(200, LoaderPhase::Complete));

        let Json(body) = progress_handler(State(Arc::clone(&state))).await;
        assert_eq!(
            body,
            ProgressBody {
                generated: 200,
                total: 200,
                percent: 100.0,
                phase: LoaderPhase::Complete,
                complete: true,
            }
        );

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["phase"], "complete");
        assert_eq!(state.read().await.updates(), 2);
    }

    #[tokio::test]
    async fn test_status_serves_full_snapshot() {
        let state = shared();
        state.write().await.update(snapshot(80, LoaderPhase::BackgroundFill));

        let Json(status) = status_handler(State(Arc::clone(&state))).await;
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["records_generated"], 80);
        assert_eq!(json["loader_phase"], "background_fill");
        assert_eq!(json["background_active"], true);
        assert_eq!(json["distribution"]["normal"], 80);
    }

    #[tokio::test]
    async fn test_metrics_and_health_read_shared_state() {
        let state = shared();
        state.write().await.update(snapshot(7, LoaderPhase::Partial));

        let response = metrics_handler(State(Arc::clone(&state))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], PROMETHEUS_CONTENT_TYPE);
        let output = state.read().await.encode().unwrap();
        assert!(output.contains("ecg_synth_records_generated 7"));

        let (status, phase) = health_handler(State(state)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(phase, "Partial");
    }
}
