//! Chemledger REST API
//!
//! HTTP API layer for the ledger, built with Axum.
//!
//! # Endpoints
//!
//! ## Records
//! - `POST /api/v1/records` - Append a record (`X-Ledger-Identity` must be the owner)
//! - `GET /api/v1/records?start=&end=&state=&action=` - Filtered listing
//! - `GET /api/v1/records/count` - Number of records
//! - `GET /api/v1/records/first?n=` / `GET /api/v1/records/last?n=`
//! - `GET /api/v1/records/:index` - Single record
//! - `GET /api/v1/records/:index/view/:schema` - Record as seen by an older schema
//!
//! ## Aggregates
//! - `GET /api/v1/aggregate/average?field=&start=&end=`
//! - `GET /api/v1/aggregate/summary?field=&start=&end=&state=&action=`
//!
//! ## Export
//! - `GET /api/v1/export?format=csv|ndjson`
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! ## WebSocket
//! - `GET /api/v1/ws` - Ledger event stream
//!
//! # Example
//!
//! ```rust,ignore
//! use chemledger::alert::BroadcastSink;
//! use chemledger::api::{serve, ApiConfig, AppState};
//! use chemledger::ledger::{Ledger, LedgerConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let events = BroadcastSink::new(1024);
//!     let ledger = Arc::new(Ledger::open(&LedgerConfig::default(), vec![Arc::new(events.clone())])?);
//!     let config = ApiConfig::default();
//!
//!     let state = AppState::with_events(ledger, config.clone(), &events);
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult, IDENTITY_HEADER};
pub use state::{ApiConfig, AppState};

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::websocket::websocket_handler;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Record routes
        .route(
            "/records",
            get(routes::records::list_records).post(routes::records::append_record),
        )
        .route("/records/count", get(routes::records::count_records))
        .route("/records/first", get(routes::records::first_records))
        .route("/records/last", get(routes::records::last_records))
        .route("/records/:index", get(routes::records::get_record))
        .route(
            "/records/:index/view/:schema",
            get(routes::records::view_record),
        )
        // Aggregate routes
        .route("/aggregate/average", get(routes::aggregate::average))
        .route("/aggregate/summary", get(routes::aggregate::summary))
        // Export routes
        .route("/export", get(routes::export::export_records))
        .layer(DefaultBodyLimit::max(state.config.max_body_size))
        // WebSocket route
        .route("/ws", get(websocket_handler));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Chemledger API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Chemledger API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::BroadcastSink;
    use crate::ledger::{Identity, Ledger, LedgerConfig, RecordFields};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use tempfile::tempdir;
    use tower::util::ServiceExt;

    const OWNER: &str = "gateway";

    fn create_test_app() -> (Router, Arc<Ledger>) {
        let ledger = Arc::new(Ledger::in_memory(OWNER, 100));
        let router = build_router(AppState::new(Arc::clone(&ledger), ApiConfig::default()));
        (router, ledger)
    }

    fn seeded_app() -> Router {
        let (app, ledger) = create_test_app();
        let owner = Identity::new(OWNER);
        for (ts, stock, temp) in [(100, 50, -3), (200, 500, -4), (300, 80, 10)] {
            ledger
                .append(
                    &owner,
                    RecordFields::new().timestamp(ts).stock(stock).temperature(temp),
                )
                .unwrap();
        }
        app
    }

    async fn get(app: &Router, uri: &str) -> Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn post_record(app: &Router, identity: Option<&str>, body: &str) -> Response {
        let mut request = Request::builder()
            .method("POST")
            .uri("/api/v1/records")
            .header("Content-Type", "application/json");
        if let Some(identity) = identity {
            request = request.header(IDENTITY_HEADER, identity);
        }
        app.clone()
            .oneshot(request.body(Body::from(body.to_string())).unwrap())
            .await
            .unwrap()
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let (app, _) = create_test_app();

        assert_eq!(get(&app, "/health/live").await.status(), StatusCode::OK);
        assert_eq!(get(&app, "/health/ready").await.status(), StatusCode::OK);

        let response = get(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["records"], 0);
    }

    #[tokio::test]
    async fn test_append_as_owner() {
        let (app, ledger) = create_test_app();

        let response = post_record(&app, Some(OWNER), r#"{"timestamp": 1000, "available_stock": 50}"#).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = json_body(response).await;
        assert_eq!(body["index"], 0);
        assert_eq!(body["low_inventory"], true);
        assert_eq!(body["events"][0]["type"], "record_created");
        assert_eq!(body["events"][1]["type"], "low_inventory_alert");
        assert_eq!(body["events"][1]["amount_used"], 50);
        assert_eq!(ledger.count(), 1);
    }

    #[tokio::test]
    async fn test_append_as_stranger_is_forbidden() {
        let (app, ledger) = create_test_app();

        let response = post_record(&app, Some("intruder"), r#"{"available_stock": 5}"#).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let body = json_body(response).await;
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
        assert!(body["request_id"].is_string());
        assert_eq!(ledger.count(), 0);
    }

    #[tokio::test]
    async fn test_append_without_identity() {
        let (app, _) = create_test_app();
        let response = post_record(&app, None, "{}").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_append_invalid_json() {
        let (app, _) = create_test_app();
        let response = post_record(&app, Some(OWNER), "not json").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_count_get_first_last() {
        let app = seeded_app();

        let body = json_body(get(&app, "/api/v1/records/count").await).await;
        assert_eq!(body["count"], 3);

        let body = json_body(get(&app, "/api/v1/records/1").await).await;
        assert_eq!(body["timestamp"], 200);
        assert_eq!(body["source"], OWNER);

        let body = json_body(get(&app, "/api/v1/records/first?n=2").await).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["timestamp"], 100);

        let body = json_body(get(&app, "/api/v1/records/last?n=1").await).await;
        assert_eq!(body[0]["timestamp"], 300);
    }

    #[tokio::test]
    async fn test_get_out_of_bounds() {
        let app = seeded_app();
        let response = get(&app, "/api/v1/records/5").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"]["code"], "OUT_OF_BOUNDS");
    }

    #[tokio::test]
    async fn test_list_records_with_range() {
        let app = seeded_app();

        let body = json_body(get(&app, "/api/v1/records?start=150&end=300").await).await;
        assert_eq!(body["count"], 2);
        assert_eq!(body["records"][0]["index"], 1);
        assert_eq!(body["records"][1]["timestamp"], 300);
    }

    #[tokio::test]
    async fn test_list_records_inverted_range() {
        let app = seeded_app();
        let response = get(&app, "/api/v1/records?start=300&end=100").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_RANGE");
    }

    #[tokio::test]
    async fn test_list_records_by_state() {
        let app = seeded_app();
        let body = json_body(get(&app, "/api/v1/records?state=undefined").await).await;
        assert_eq!(body["count"], 3);

        let body = json_body(get(&app, "/api/v1/records?state=normal").await).await;
        assert_eq!(body["count"], 0);

        let response = get(&app, "/api/v1/records?action=spill").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_view_record() {
        let app = seeded_app();

        let body = json_body(get(&app, "/api/v1/records/0/view/v1").await).await;
        assert_eq!(body["temperature"], -3);
        assert!(body.get("available_stock").is_none());

        let response = get(&app, "/api/v1/records/0/view/v9").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_average() {
        let app = seeded_app();

        let body = json_body(get(&app, "/api/v1/aggregate/average?field=temperature&start=100&end=200").await).await;
        assert_eq!(body["average"], -3);
        assert_eq!(body["field"], "temperature");

        let body = json_body(get(&app, "/api/v1/aggregate/average?field=available_stock").await).await;
        assert_eq!(body["average"], 210);
    }

    #[tokio::test]
    async fn test_average_no_data() {
        let app = seeded_app();
        let response = get(&app, "/api/v1/aggregate/average?field=weight&start=1000&end=2000").await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json_body(response).await["error"]["code"], "NO_DATA");
    }

    #[tokio::test]
    async fn test_average_unknown_field() {
        let app = seeded_app();
        let response = get(&app, "/api/v1/aggregate/average?field=viscosity").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_summary() {
        let app = seeded_app();
        let body = json_body(get(&app, "/api/v1/aggregate/summary?field=stock").await).await;

        assert_eq!(body["count"], 3);
        assert_eq!(body["sum"], "630");
        assert_eq!(body["min"], 50);
        assert_eq!(body["max"], 500);
    }

    #[tokio::test]
    async fn test_export_csv() {
        let app = seeded_app();
        let response = get(&app, "/api/v1/export?format=csv").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/csv");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert_eq!(text.lines().count(), 4);
    }

    #[tokio::test]
    async fn test_export_unknown_format() {
        let app = seeded_app();
        let response = get(&app, "/api/v1/export?format=xml").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_append_reaches_event_stream() {
        let dir = tempdir().unwrap();
        let events = BroadcastSink::new(16);
        let mut rx = events.subscribe();
        let ledger = Arc::new(
            Ledger::open(
                &LedgerConfig::new(OWNER, dir.path()),
                vec![Arc::new(events.clone())],
            )
            .unwrap(),
        );
        let app = build_router(AppState::with_events(ledger, ApiConfig::default(), &events));

        let response = post_record(&app, Some(OWNER), r#"{"available_stock": 500}"#).await;
        assert_eq!(response.status(), StatusCode::CREATED);

        let event = rx.recv().await.unwrap();
        assert_eq!(event.topic(), "records.created");
        assert_eq!(event.index(), 0);
    }
}
