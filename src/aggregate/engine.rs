//! Aggregation engine
//!
//! Means and summaries over a field. Sums are accumulated as i128, which
//! holds any realistic number of i64 or u64 values without overflow.
//! Signed means truncate toward zero; unsigned means floor.

use crate::aggregate::field::{Field, FieldValue, NumericDomain};
use crate::ledger::{Ledger, LedgerError, LedgerResult, MeasurementRecord, TimeRange};
use crate::query::RecordFilter;
use std::sync::Arc;

/// One-pass statistics for a field over a filtered set of records
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSummary {
    pub field: Field,
    pub count: u64,
    pub sum: i128,
    pub min: FieldValue,
    pub max: FieldValue,
    pub mean: FieldValue,
}

struct Accumulator {
    field: Field,
    count: u64,
    sum: i128,
    min: i128,
    max: i128,
}

impl Accumulator {
    fn new(field: Field) -> Self {
        Self {
            field,
            count: 0,
            sum: 0,
            min: i128::MAX,
            max: i128::MIN,
        }
    }

    fn push(&mut self, record: &MeasurementRecord) {
        let value = self.field.value_of(record).widen();
        self.count += 1;
        self.sum += value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    fn finish(self) -> LedgerResult<FieldSummary> {
        if self.count == 0 {
            return Err(LedgerError::NoData);
        }

        let domain = self.field.domain();
        let count = self.count as i128;
        let mean = match domain {
            NumericDomain::Signed => self.sum / count,
            NumericDomain::Unsigned => self.sum.div_euclid(count),
        };

        Ok(FieldSummary {
            field: self.field,
            count: self.count,
            sum: self.sum,
            min: FieldValue::narrow(domain, self.min),
            max: FieldValue::narrow(domain, self.max),
            mean: FieldValue::narrow(domain, mean),
        })
    }
}

/// Aggregations over a ledger
#[derive(Clone)]
pub struct AggregationEngine {
    ledger: Arc<Ledger>,
}

impl AggregationEngine {
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }

    /// Mean of `field` over records with `timestamp` in `[start, end]`
    pub fn average(&self, field: Field, start: i64, end: i64) -> LedgerResult<FieldValue> {
        let range = TimeRange::new(start, end)?;
        self.average_where(field, &RecordFilter::new().range(range))
    }

    pub fn average_where(&self, field: Field, filter: &RecordFilter) -> LedgerResult<FieldValue> {
        self.summarize(field, filter).map(|summary| summary.mean)
    }

    pub fn summarize(&self, field: Field, filter: &RecordFilter) -> LedgerResult<FieldSummary> {
        let summary = self.ledger.read(|records| {
            let mut acc = Accumulator::new(field);
            for (_, record) in filter.apply(records) {
                acc.push(record);
            }
            acc.finish()
        });

        if let Ok(ref s) = summary {
            tracing::debug!(field = %field, count = s.count, mean = %s.mean, "Aggregated field");
        }
        summary
    }
}
