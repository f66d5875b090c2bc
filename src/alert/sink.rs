//! Event sinks
//!
//! A sink receives every ledger event synchronously, inside the append call
//! that produced it. Sinks cannot fail an append, so `publish` returns nothing.

use crate::alert::events::LedgerEvent;
use tokio::sync::broadcast;

/// Receiver of ledger events
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &LedgerEvent);
}

impl<F> EventSink for F
where
    F: Fn(&LedgerEvent) + Send + Sync,
{
    fn publish(&self, event: &LedgerEvent) {
        self(event)
    }
}

/// Fans events out to any number of async subscribers
///
/// Sending never blocks; subscribers that fall behind by more than the
/// channel capacity observe a lag error and skip ahead.
#[derive(Debug, Clone)]
pub struct BroadcastSink {
    tx: broadcast::Sender<LedgerEvent>,
}

impl BroadcastSink {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.tx.subscribe()
    }

    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl EventSink for BroadcastSink {
    fn publish(&self, event: &LedgerEvent) {
        // No receivers is not an error
        let _ = self.tx.send(event.clone());
    }
}

/// Writes every event to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, event: &LedgerEvent) {
        match event {
            LedgerEvent::RecordCreated {
                index,
                timestamp,
                state,
                action,
                ..
            } => {
                tracing::debug!(index, timestamp, state = %state, action = %action, "Record created");
            }
            LedgerEvent::LowInventoryAlert {
                index,
                amount_used,
                threshold,
                ..
            } => {
                tracing::info!(index, amount_used, threshold, "Low inventory");
            }
        }
    }
}
