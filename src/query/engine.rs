//! Query engine
//!
//! Read-only retrieval over a shared ledger. Every query scans one consistent
//! snapshot in a single pass and returns matches in ledger order.

use crate::ledger::{
    Ledger, LedgerResult, MeasurementRecord, RecordAction, RecordState, TimeRange,
};
use crate::query::filter::RecordFilter;
use serde::Serialize;
use std::sync::Arc;

/// A record paired with its ledger index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexedRecord {
    pub index: usize,
    #[serde(flatten)]
    pub record: MeasurementRecord,
}

/// Query executor over a ledger
#[derive(Clone)]
pub struct QueryEngine {
    ledger: Arc<Ledger>,
}

impl QueryEngine {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    pub fn count(&self) -> usize {
        self.ledger.count()
    }

    pub fn get(&self, index: usize) -> LedgerResult<MeasurementRecord> {
        self.ledger.get(index)
    }

    pub fn first(&self, n: usize) -> Vec<MeasurementRecord> {
        self.ledger.first(n)
    }

    pub fn last(&self, n: usize) -> Vec<MeasurementRecord> {
        self.ledger.last(n)
    }

    /// Records with `timestamp` in `[start, end]`
    pub fn range(&self, start: i64, end: i64) -> LedgerResult<Vec<MeasurementRecord>> {
        let range = TimeRange::new(start, end)?;
        Ok(self.filter(&RecordFilter::new().range(range)))
    }

    /// Records in `state`, optionally limited to a closed time window
    pub fn by_state(
        &self,
        state: RecordState,
        window: Option<(i64, i64)>,
    ) -> LedgerResult<Vec<MeasurementRecord>> {
        let filter = Self::windowed(RecordFilter::new().state(state), window)?;
        Ok(self.filter(&filter))
    }

    /// Records with `action`, optionally limited to a closed time window
    pub fn by_action(
        &self,
        action: RecordAction,
        window: Option<(i64, i64)>,
    ) -> LedgerResult<Vec<MeasurementRecord>> {
        let filter = Self::windowed(RecordFilter::new().action(action), window)?;
        Ok(self.filter(&filter))
    }

    fn windowed(filter: RecordFilter, window: Option<(i64, i64)>) -> LedgerResult<RecordFilter> {
        match window {
            Some((start, end)) => filter.between(start, end),
            None => Ok(filter),
        }
    }

    pub fn filter(&self, filter: &RecordFilter) -> Vec<MeasurementRecord> {
        self.ledger.read(|records| {
            filter
                .apply(records)
                .map(|(_, record)| record.clone())
                .collect()
        })
    }

    /// Like `filter`, keeping each record's index
    pub fn filter_indexed(&self, filter: &RecordFilter) -> Vec<IndexedRecord> {
        let matches: Vec<IndexedRecord> = self.ledger.read(|records| {
            filter
                .apply(records)
                .map(|(index, record)| IndexedRecord {
                    index,
                    record: record.clone(),
                })
                .collect()
        });

        tracing::debug!(matched = matches.len(), ?filter, "Filter query");
        matches
    }
}
