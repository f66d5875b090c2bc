//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::aggregate::{Field, FieldSummary, FieldValue};
use crate::alert::LedgerEvent;
use crate::api::error::{ApiError, ApiResult};
use crate::ledger::{LedgerResult, RecordAction, RecordState, TimeRange};
use crate::query::{IndexedRecord, RecordFilter};

// ============================================
// RECORD DTOs
// ============================================

/// Append response
#[derive(Debug, Serialize, Deserialize)]
pub struct AppendResponse {
    /// Index assigned to the new record
    pub index: usize,
    /// Whether a low-inventory alert fired
    pub low_inventory: bool,
    pub events: Vec<LedgerEvent>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: usize,
}

/// `?n=` for first/last
#[derive(Debug, Deserialize)]
pub struct LimitParams {
    #[serde(default = "default_limit")]
    pub n: usize,
}

fn default_limit() -> usize {
    10
}

/// Filter query string shared by record listing and summaries
#[derive(Debug, Default, Deserialize)]
pub struct FilterParams {
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub state: Option<String>,
    pub action: Option<String>,
}

impl FilterParams {
    pub fn to_filter(&self) -> LedgerResult<RecordFilter> {
        let mut filter = RecordFilter::new();
        if self.start.is_some() || self.end.is_some() {
            filter = filter.range(TimeRange::from_bounds(self.start, self.end)?);
        }
        if let Some(state) = &self.state {
            filter = filter.state(state.parse::<RecordState>()?);
        }
        if let Some(action) = &self.action {
            filter = filter.action(action.parse::<RecordAction>()?);
        }
        Ok(filter)
    }
}

#[derive(Debug, Serialize)]
pub struct RecordsResponse {
    pub count: usize,
    pub records: Vec<IndexedRecord>,
}

// ============================================
// AGGREGATE DTOs
// ============================================

#[derive(Debug, Deserialize)]
pub struct AverageParams {
    pub field: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AverageResponse {
    pub field: Field,
    pub average: FieldValue,
    pub start: i64,
    pub end: i64,
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    pub field: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
    pub state: Option<String>,
    pub action: Option<String>,
}

impl SummaryParams {
    pub fn filter_params(&self) -> FilterParams {
        FilterParams {
            start: self.start,
            end: self.end,
            state: self.state.clone(),
            action: self.action.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub field: Field,
    pub count: u64,
    /// Exact sum, as a string since it may exceed 64 bits
    pub sum: String,
    pub min: FieldValue,
    pub max: FieldValue,
    pub mean: FieldValue,
}

impl From<FieldSummary> for SummaryResponse {
    fn from(summary: FieldSummary) -> Self {
        Self {
            field: summary.field,
            count: summary.count,
            sum: summary.sum.to_string(),
            min: summary.min,
            max: summary.max,
            mean: summary.mean,
        }
    }
}

/// Parse a field name, listing the accepted names on failure
pub fn parse_field(name: &str) -> ApiResult<Field> {
    name.parse::<Field>().map_err(|_| {
        let known: Vec<&str> = Field::all().iter().map(Field::name).collect();
        ApiError::Validation(format!(
            "Unknown field '{}', expected one of: {}",
            name,
            known.join(", ")
        ))
    })
}

// ============================================
// EXPORT DTOs
// ============================================

/// Export query parameters
#[derive(Debug, Deserialize)]
pub struct ExportParams {
    /// Output format: csv or ndjson
    #[serde(default = "default_export_format")]
    pub format: String,
    pub start: Option<i64>,
    pub end: Option<i64>,
}

fn default_export_format() -> String {
    "csv".to_string()
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health status response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy or unhealthy
    pub status: String,
    /// Ledger status: ok or error
    pub ledger: String,
    pub records: usize,
    pub durable: bool,
    pub ws_connections: usize,
    pub uptime_seconds: u64,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_params_to_filter() {
        let params = FilterParams {
            start: Some(10),
            end: None,
            state: Some("normal".to_string()),
            action: None,
        };
        let filter = params.to_filter().unwrap();

        assert_eq!(filter.range, Some(TimeRange { start: 10, end: i64::MAX }));
        assert_eq!(filter.state, Some(RecordState::Normal));
        assert!(filter.action.is_none());
    }

    #[test]
    fn test_filter_params_without_bounds_has_no_range() {
        assert!(FilterParams::default().to_filter().unwrap().is_empty());
    }

    #[test]
    fn test_filter_params_reject_bad_values() {
        let inverted = FilterParams {
            start: Some(5),
            end: Some(1),
            ..Default::default()
        };
        assert!(inverted.to_filter().is_err());

        let unknown = FilterParams {
            action: Some("spill".to_string()),
            ..Default::default()
        };
        assert!(unknown.to_filter().is_err());
    }

    #[test]
    fn test_parse_field_lists_known_fields() {
        assert_eq!(parse_field("stock").unwrap(), Field::AvailableStock);

        match parse_field("viscosity") {
            Err(ApiError::Validation(message)) => {
                assert!(message.contains("viscosity"));
                assert!(message.contains("temperature"));
                assert!(message.contains("available_stock"));
            }
            other => panic!("expected a validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_summary_sum_is_string() {
        let response = SummaryResponse::from(FieldSummary {
            field: Field::Weight,
            count: 2,
            sum: 3,
            min: FieldValue::Unsigned(1),
            max: FieldValue::Unsigned(2),
            mean: FieldValue::Unsigned(1),
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["sum"], "3");
        assert_eq!(json["field"], "weight");
    }
}
