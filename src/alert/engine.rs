//! Alert engine
//!
//! Turns each appended record into its event pair and dispatches the events
//! to the registered sinks, in order, before the append returns.

use crate::alert::events::LedgerEvent;
use crate::alert::sink::EventSink;
use crate::ledger::MeasurementRecord;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Stock level below which a low-inventory alert fires
pub const DEFAULT_LOW_STOCK_THRESHOLD: u64 = 100;

/// Event producer for the append path
pub struct AlertEngine {
    threshold: u64,
    sinks: Vec<Arc<dyn EventSink>>,
}

impl AlertEngine {
    pub fn new(threshold: u64) -> Self {
        Self {
            threshold,
            sinks: Vec::new(),
        }
    }

    /// Builder: register a sink
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Events a record at `index` produces: `RecordCreated`, then an
    /// optional `LowInventoryAlert`
    pub fn evaluate(&self, record: &MeasurementRecord, index: usize) -> Vec<LedgerEvent> {
        let mut events = Vec::with_capacity(2);

        events.push(LedgerEvent::RecordCreated {
            timestamp: record.timestamp,
            source: record.source.clone(),
            state: record.state,
            action: record.action,
            index,
        });

        if record.is_low_stock(self.threshold) {
            events.push(LedgerEvent::LowInventoryAlert {
                timestamp: record.timestamp,
                source: record.source.clone(),
                amount_used: record.available_stock,
                threshold: self.threshold,
                index,
            });
        }

        events
    }

    /// Evaluate a freshly committed record and publish its events
    pub fn on_append(&self, record: &MeasurementRecord, index: usize) -> Vec<LedgerEvent> {
        let events = self.evaluate(record, index);

        for event in &events {
            for sink in &self.sinks {
                // Runs under the ledger's append lock; a panic must not poison it
                if panic::catch_unwind(AssertUnwindSafe(|| sink.publish(event))).is_err() {
                    tracing::error!(
                        index,
                        topic = event.topic(),
                        "Event sink panicked, event dropped for that sink"
                    );
                }
            }
        }

        if events.len() > 1 {
            tracing::info!(
                index,
                stock = record.available_stock,
                threshold = self.threshold,
                "Low inventory alert raised"
            );
        }

        events
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_STOCK_THRESHOLD)
    }
}
