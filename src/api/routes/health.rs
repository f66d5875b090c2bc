//! Health Routes
//!
//! Health check endpoints for monitoring and Kubernetes probes.
//!
//! - GET /health/live - Liveness probe (process is alive)
//! - GET /health/ready - Readiness probe (ledger is usable)
//! - GET /health - Full health status

use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::api::dto::HealthResponse;
use crate::api::state::AppState;
use crate::ledger::{LedgerError, LedgerResult, LedgerStats};

/// Ledger stats off the async workers; the store lock is held across journal fsyncs
async fn ledger_stats(state: &AppState) -> LedgerResult<LedgerStats> {
    let ledger = Arc::clone(&state.ledger);
    tokio::task::spawn_blocking(move || ledger.stats())
        .await
        .map_err(|e| LedgerError::Lock(format!("Stats task failed: {}", e)))?
}

/// GET /health/live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

/// GET /health/ready
///
/// Not ready when the ledger's store lock is unusable.
pub async fn readiness(State(state): State<Arc<AppState>>) -> StatusCode {
    match ledger_stats(&state).await {
        Ok(_) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// GET /health
pub async fn full_health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let stats = ledger_stats(&state).await;
    let ws_connections = state.ws_connection_count().await;

    let (status, ledger, durable) = match &stats {
        Ok(stats) => ("healthy", "ok", stats.durable),
        Err(e) => {
            tracing::error!(error = %e, "Ledger health check failed");
            ("unhealthy", "error", false)
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        ledger: ledger.to_string(),
        records: state.ledger.count(),
        durable,
        ws_connections,
        uptime_seconds: state.uptime_seconds(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
