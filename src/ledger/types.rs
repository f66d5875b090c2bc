//! Core data types for the measurement ledger
//!
//! This module defines the fundamental types used throughout the ledger:
//! - `MeasurementRecord`: One immutable sensor reading
//! - `RecordFields`: The caller-supplied part of a reading
//! - `Identity`: A principal (the owner, or anyone calling in)
//! - `TimeRange`: A closed time interval for queries
//! - `RecordState` and `RecordAction`: Classification enums

use crate::ledger::error::{LedgerError, LedgerResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity of a principal talking to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Sensor/system health classification
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordState {
    /// Readings within expected bounds
    Normal,
    /// Vessel reported empty
    Empty,
    /// Sensor reported inconsistent data
    Corrupted,
    /// No classification available
    #[default]
    Undefined,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordState::Normal => write!(f, "NORMAL"),
            RecordState::Empty => write!(f, "EMPTY"),
            RecordState::Corrupted => write!(f, "CORRUPTED"),
            RecordState::Undefined => write!(f, "UNDEFINED"),
        }
    }
}

impl FromStr for RecordState {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NORMAL" => Ok(RecordState::Normal),
            "EMPTY" => Ok(RecordState::Empty),
            "CORRUPTED" => Ok(RecordState::Corrupted),
            "UNDEFINED" => Ok(RecordState::Undefined),
            _ => Err(LedgerError::UnknownVariant {
                kind: "state",
                value: s.to_string(),
            }),
        }
    }
}

/// Operator or automation action concurrent with a reading
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordAction {
    Fill,
    Empty,
    #[default]
    None,
}

impl fmt::Display for RecordAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordAction::Fill => write!(f, "FILL"),
            RecordAction::Empty => write!(f, "EMPTY"),
            RecordAction::None => write!(f, "NONE"),
        }
    }
}

impl FromStr for RecordAction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FILL" => Ok(RecordAction::Fill),
            "EMPTY" => Ok(RecordAction::Empty),
            "NONE" => Ok(RecordAction::None),
            _ => Err(LedgerError::UnknownVariant {
                kind: "action",
                value: s.to_string(),
            }),
        }
    }
}

/// Fields supplied by the writer when appending a reading
///
/// Everything except the writer identity comes from here. When `timestamp`
/// is `None` the ledger stamps the record with the current wall-clock second.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RecordFields {
    /// Unix timestamp in seconds, defaults to now
    pub timestamp: Option<i64>,
    pub temperature: i64,
    pub humidity: u64,
    pub density: u64,
    pub conductivity: u64,
    pub weight: u64,
    pub volume: u64,
    pub ph: u64,
    pub color: u64,
    pub available_stock: u64,
    pub state: RecordState,
    pub action: RecordAction,
    /// Opaque commitment produced outside the ledger
    pub integrity_tag: Option<String>,
}

impl RecordFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn temperature(mut self, value: i64) -> Self {
        self.temperature = value;
        self
    }

    pub fn humidity(mut self, value: u64) -> Self {
        self.humidity = value;
        self
    }

    pub fn density(mut self, value: u64) -> Self {
        self.density = value;
        self
    }

    pub fn conductivity(mut self, value: u64) -> Self {
        self.conductivity = value;
        self
    }

    pub fn weight(mut self, value: u64) -> Self {
        self.weight = value;
        self
    }

    pub fn volume(mut self, value: u64) -> Self {
        self.volume = value;
        self
    }

    pub fn ph(mut self, value: u64) -> Self {
        self.ph = value;
        self
    }

    pub fn color(mut self, value: u64) -> Self {
        self.color = value;
        self
    }

    pub fn stock(mut self, value: u64) -> Self {
        self.available_stock = value;
        self
    }

    pub fn state(mut self, state: RecordState) -> Self {
        self.state = state;
        self
    }

    pub fn action(mut self, action: RecordAction) -> Self {
        self.action = action;
        self
    }

    pub fn integrity_tag(mut self, tag: impl Into<String>) -> Self {
        self.integrity_tag = Some(tag.into());
        self
    }
}

/// One sensor reading as stored in the ledger
///
/// Records are only created by `Ledger::append` and never change afterwards;
/// readers always receive copies.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MeasurementRecord {
    /// Unix timestamp in seconds
    pub timestamp: i64,
    /// Identity that appended the record
    pub source: Identity,
    pub temperature: i64,
    pub humidity: u64,
    pub density: u64,
    pub conductivity: u64,
    pub weight: u64,
    pub volume: u64,
    pub ph: u64,
    pub color: u64,
    pub available_stock: u64,
    pub state: RecordState,
    pub action: RecordAction,
    #[serde(default)]
    pub integrity_tag: Option<String>,
}

impl MeasurementRecord {
    /// Build a record from writer fields, stamping `now` when no timestamp was given
    pub(crate) fn from_fields(fields: RecordFields, source: Identity, now: i64) -> Self {
        Self {
            timestamp: fields.timestamp.unwrap_or(now),
            source,
            temperature: fields.temperature,
            humidity: fields.humidity,
            density: fields.density,
            conductivity: fields.conductivity,
            weight: fields.weight,
            volume: fields.volume,
            ph: fields.ph,
            color: fields.color,
            available_stock: fields.available_stock,
            state: fields.state,
            action: fields.action,
            integrity_tag: fields.integrity_tag,
        }
    }

    /// Whether the stock level is strictly below `threshold`
    pub fn is_low_stock(&self, threshold: u64) -> bool {
        self.available_stock < threshold
    }
}

/// Time range for queries (closed interval: [start, end])
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start timestamp (inclusive), in seconds
    pub start: i64,
    /// End timestamp (inclusive), in seconds
    pub end: i64,
}

impl TimeRange {
    /// Create a new time range, failing with `InvalidRange` if start > end
    pub fn new(start: i64, end: i64) -> LedgerResult<Self> {
        if start > end {
            return Err(LedgerError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Build a range from optional bounds, open ends extending to the extremes
    pub fn from_bounds(start: Option<i64>, end: Option<i64>) -> LedgerResult<Self> {
        Self::new(start.unwrap_or(i64::MIN), end.unwrap_or(i64::MAX))
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        timestamp >= self.start && timestamp <= self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_from_fields_keeps_writer_timestamp() {
        let fields = RecordFields::new().timestamp(1_700_000_000).stock(40);
        let record = MeasurementRecord::from_fields(fields, Identity::new("owner"), 5);

        assert_eq!(record.timestamp, 1_700_000_000);
        assert_eq!(record.source.as_str(), "owner");
        assert_eq!(record.available_stock, 40);
    }

    #[test]
    fn test_record_from_fields_stamps_now() {
        let record = MeasurementRecord::from_fields(RecordFields::new(), Identity::new("o"), 42);
        assert_eq!(record.timestamp, 42);
        assert_eq!(record.state, RecordState::Undefined);
        assert_eq!(record.action, RecordAction::None);
    }

    #[test]
    fn test_low_stock_is_strict() {
        let record =
            MeasurementRecord::from_fields(RecordFields::new().stock(100), Identity::new("o"), 0);
        assert!(!record.is_low_stock(100));
        assert!(record.is_low_stock(101));
    }

    #[test]
    fn test_time_range_inclusive_bounds() {
        let range = TimeRange::new(1000, 2000).unwrap();

        assert!(!range.contains(999));
        assert!(range.contains(1000));
        assert!(range.contains(1500));
        assert!(range.contains(2000));
        assert!(!range.contains(2001));
    }

    #[test]
    fn test_time_range_single_point() {
        let range = TimeRange::new(5, 5).unwrap();
        assert!(range.contains(5));
        assert!(!range.contains(4));
    }

    #[test]
    fn test_time_range_rejects_inverted() {
        let err = TimeRange::new(10, 9).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRange { start: 10, end: 9 }));
    }

    #[test]
    fn test_time_range_from_bounds() {
        let range = TimeRange::from_bounds(Some(10), None).unwrap();
        assert_eq!(range.start, 10);
        assert_eq!(range.end, i64::MAX);

        let open = TimeRange::from_bounds(None, None).unwrap();
        assert!(open.contains(i64::MIN) && open.contains(i64::MAX));
    }

    #[test]
    fn test_state_and_action_parsing() {
        assert_eq!("normal".parse::<RecordState>().unwrap(), RecordState::Normal);
        assert_eq!("CORRUPTED".parse::<RecordState>().unwrap(), RecordState::Corrupted);
        assert_eq!("fill".parse::<RecordAction>().unwrap(), RecordAction::Fill);
        assert!("sideways".parse::<RecordAction>().is_err());
    }

    #[test]
    fn test_fields_deserialize_with_defaults() {
        let json = r#"{"temperature": -12, "available_stock": 30, "state": "EMPTY"}"#;
        let fields: RecordFields = serde_json::from_str(json).unwrap();

        assert_eq!(fields.temperature, -12);
        assert_eq!(fields.available_stock, 30);
        assert_eq!(fields.state, RecordState::Empty);
        assert_eq!(fields.action, RecordAction::None);
        assert!(fields.timestamp.is_none());
    }

    #[test]
    fn test_record_serialization() {
        let record = MeasurementRecord::from_fields(
            RecordFields::new().temperature(21).integrity_tag("ab12"),
            Identity::new("gateway"),
            1000,
        );
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"source\":\"gateway\""));
        assert!(json.contains("\"state\":\"UNDEFINED\""));

        let restored: MeasurementRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, record);
    }
}
