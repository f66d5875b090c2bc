//! WebSocket Message Types
//!
//! Defines all message types exchanged between streaming clients and the
//! ledger server.

use crate::alert::LedgerEvent;
use serde::{Deserialize, Serialize};

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Subscribe to topics (e.g., "alerts.low_inventory", "records.*")
    Subscribe { topics: Vec<String> },
    /// Unsubscribe from topics
    Unsubscribe { topics: Vec<String> },
    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Connection established
    Connected { connection_id: String },
    /// Subscription confirmed
    Subscribed {
        /// Topics successfully subscribed to
        topics: Vec<String>,
    },
    /// Unsubscription confirmed
    Unsubscribed { topics: Vec<String> },
    /// Pong response to ping
    Pong,
    /// A ledger event on a subscribed topic
    Event { topic: String, event: LedgerEvent },
    /// Error message
    Error { message: String },
}

impl ServerMessage {
    pub fn event(event: LedgerEvent) -> Self {
        ServerMessage::Event {
            topic: event.topic().to_string(),
            event,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Identity;

    #[test]
    fn test_client_message_deserialize_subscribe() {
        let json = r#"{"type": "subscribe", "topics": ["alerts.low_inventory", "records.*"]}"#;
        let msg: ClientMessage = serde_json::from_str(json).unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => {
                assert_eq!(topics.len(), 2);
                assert_eq!(topics[0], "alerts.low_inventory");
            }
            _ => panic!("Expected Subscribe"),
        }
    }

    #[test]
    fn test_client_message_deserialize_ping() {
        let msg: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Ping));
    }

    #[test]
    fn test_server_message_serialize_event() {
        let msg = ServerMessage::event(LedgerEvent::LowInventoryAlert {
            timestamp: 1_700_000_000,
            source: Identity::new("gateway"),
            amount_used: 50,
            threshold: 100,
            index: 0,
        });
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["type"], "event");
        assert_eq!(json["topic"], "alerts.low_inventory");
        assert_eq!(json["event"]["type"], "low_inventory_alert");
        assert_eq!(json["event"]["amount_used"], 50);
    }

    #[test]
    fn test_server_message_serialize_connected() {
        let msg = ServerMessage::Connected {
            connection_id: "abc-123".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"type\":\"connected\""));
        assert!(json.contains("\"connection_id\":\"abc-123\""));
    }
}
