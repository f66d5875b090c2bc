//! Record filters
//!
//! A `RecordFilter` is a conjunction of optional criteria. An empty filter
//! matches every record.

use crate::ledger::{LedgerResult, MeasurementRecord, RecordAction, RecordState, TimeRange};
use serde::{Deserialize, Serialize};

/// Predicate over time range, state and action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordFilter {
    pub range: Option<TimeRange>,
    pub state: Option<RecordState>,
    pub action: Option<RecordAction>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: restrict to a closed time range
    pub fn range(mut self, range: TimeRange) -> Self {
        self.range = Some(range);
        self
    }

    /// Builder: restrict to `[start, end]`, failing if `start > end`
    pub fn between(self, start: i64, end: i64) -> LedgerResult<Self> {
        Ok(self.range(TimeRange::new(start, end)?))
    }

    /// Builder: restrict to one state
    pub fn state(mut self, state: RecordState) -> Self {
        self.state = Some(state);
        self
    }

    /// Builder: restrict to one action
    pub fn action(mut self, action: RecordAction) -> Self {
        self.action = Some(action);
        self
    }

    /// True when no criterion is set
    pub fn is_empty(&self) -> bool {
        self.range.is_none() && self.state.is_none() && self.action.is_none()
    }

    pub fn matches(&self, record: &MeasurementRecord) -> bool {
        self.range.map_or(true, |r| r.contains(record.timestamp))
            && self.state.map_or(true, |s| record.state == s)
            && self.action.map_or(true, |a| record.action == a)
    }

    /// Matching records with their ledger indexes, in ledger order
    pub fn apply<'a>(
        &'a self,
        records: &'a [MeasurementRecord],
    ) -> impl Iterator<Item = (usize, &'a MeasurementRecord)> + 'a {
        records
            .iter()
            .enumerate()
            .filter(move |(_, record)| self.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{Identity, RecordFields};

    fn record(ts: i64, state: RecordState, action: RecordAction) -> MeasurementRecord {
        MeasurementRecord::from_fields(
            RecordFields::new().timestamp(ts).state(state).action(action),
            Identity::new("gateway"),
            0,
        )
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let filter = RecordFilter::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&record(1, RecordState::Normal, RecordAction::Fill)));
        assert!(filter.matches(&record(-5, RecordState::Undefined, RecordAction::None)));
    }

    #[test]
    fn test_filter_conjunction() {
        let filter = RecordFilter::new()
            .between(10, 20)
            .unwrap()
            .state(RecordState::Normal)
            .action(RecordAction::Fill);

        assert!(filter.matches(&record(10, RecordState::Normal, RecordAction::Fill)));
        assert!(filter.matches(&record(20, RecordState::Normal, RecordAction::Fill)));
        assert!(!filter.matches(&record(21, RecordState::Normal, RecordAction::Fill)));
        assert!(!filter.matches(&record(15, RecordState::Empty, RecordAction::Fill)));
        assert!(!filter.matches(&record(15, RecordState::Normal, RecordAction::Empty)));
    }

    #[test]
    fn test_between_rejects_inverted_range() {
        assert!(RecordFilter::new().between(5, 4).is_err());
    }

    #[test]
    fn test_apply_keeps_indexes_and_order() {
        let records = vec![
            record(1, RecordState::Normal, RecordAction::None),
            record(2, RecordState::Empty, RecordAction::None),
            record(3, RecordState::Normal, RecordAction::None),
        ];
        let filter = RecordFilter::new().state(RecordState::Normal);

        let indexes: Vec<usize> = filter.apply(&records).map(|(i, _)| i).collect();
        assert_eq!(indexes, vec![0, 2]);
    }
}
