//! Ledger event types
//!
//! Events are produced by the alert engine as part of a successful append
//! and handed to every registered sink.

use crate::ledger::{Identity, RecordAction, RecordState};
use serde::{Deserialize, Serialize};

/// Notification emitted for an appended record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Emitted once for every successful append
    RecordCreated {
        timestamp: i64,
        source: Identity,
        state: RecordState,
        action: RecordAction,
        index: usize,
    },
    /// Emitted when the new record's stock is below the threshold
    LowInventoryAlert {
        timestamp: i64,
        source: Identity,
        amount_used: u64,
        threshold: u64,
        index: usize,
    },
}

impl LedgerEvent {
    /// Index of the record that produced this event
    pub fn index(&self) -> usize {
        match self {
            LedgerEvent::RecordCreated { index, .. } => *index,
            LedgerEvent::LowInventoryAlert { index, .. } => *index,
        }
    }

    /// Streaming topic this event is published under
    pub fn topic(&self) -> &'static str {
        match self {
            LedgerEvent::RecordCreated { .. } => "records.created",
            LedgerEvent::LowInventoryAlert { .. } => "alerts.low_inventory",
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, LedgerEvent::LowInventoryAlert { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_created_serialization() {
        let event = LedgerEvent::RecordCreated {
            timestamp: 1_700_000_000,
            source: Identity::new("gateway"),
            state: RecordState::Normal,
            action: RecordAction::Fill,
            index: 3,
        };
        let json = serde_json::to_string(&event).unwrap();

        assert!(json.contains("\"type\":\"record_created\""));
        assert!(json.contains("\"state\":\"NORMAL\""));
        assert!(json.contains("\"action\":\"FILL\""));
        assert!(json.contains("\"index\":3"));
    }

    #[test]
    fn test_low_inventory_topic() {
        let event = LedgerEvent::LowInventoryAlert {
            timestamp: 0,
            source: Identity::new("gateway"),
            amount_used: 50,
            threshold: 100,
            index: 0,
        };
        assert_eq!(event.topic(), "alerts.low_inventory");
        assert!(event.is_alert());
        assert_eq!(event.index(), 0);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "low_inventory_alert");
        assert_eq!(json["amount_used"], 50);
    }
}
