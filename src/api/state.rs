//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use crate::aggregate::AggregationEngine;
use crate::alert::BroadcastSink;
use crate::ledger::Ledger;
use crate::query::QueryEngine;
use crate::websocket::{ConnectionHub, HubConfig};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<Ledger>,
    pub queries: QueryEngine,
    pub aggregates: AggregationEngine,
    pub config: Arc<ApiConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
    /// WebSocket connection hub for event streaming
    pub hub: Arc<ConnectionHub>,
}

impl AppState {
    /// Create state without event streaming
    pub fn new(ledger: Arc<Ledger>, config: ApiConfig) -> Self {
        let hub = Arc::new(ConnectionHub::new(HubConfig {
            max_connections: config.max_ws_connections,
        }));

        Self {
            queries: QueryEngine::new(Arc::clone(&ledger)),
            aggregates: AggregationEngine::new(Arc::clone(&ledger)),
            ledger,
            config: Arc::new(config),
            start_time: Instant::now(),
            hub,
        }
    }

    /// Create state whose hub relays everything published to `events`
    ///
    /// Must be called inside a tokio runtime.
    pub fn with_events(ledger: Arc<Ledger>, config: ApiConfig, events: &BroadcastSink) -> Self {
        let state = Self::new(ledger, config);
        Arc::clone(&state.hub).spawn_relay(events.subscribe());
        state
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub async fn ws_connection_count(&self) -> usize {
        self.hub.connection_count().await
    }
}

/// API server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Allowed CORS origins, empty allows any
    #[serde(default)]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,

    #[serde(default = "default_enable_export")]
    pub enable_export: bool,

    #[serde(default = "default_max_ws_connections")]
    pub max_ws_connections: usize,

    /// Broadcast channel capacity between the ledger and the hub
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8090
}

fn default_max_body_size() -> usize {
    1024 * 1024 // 1MB
}

fn default_enable_export() -> bool {
    true
}

fn default_max_ws_connections() -> usize {
    1000
}

fn default_event_buffer() -> usize {
    1024
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
            max_body_size: default_max_body_size(),
            enable_export: default_enable_export(),
            max_ws_connections: default_max_ws_connections(),
            event_buffer: default_event_buffer(),
        }
    }
}

impl ApiConfig {
    /// Create config with custom host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Get the socket address string
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
