//! Record schema versions and compatibility views
//!
//! The ledger stores one canonical record layout (v3). Consumers written
//! against narrower layouts read through the projections here.

use crate::ledger::error::LedgerError;
use crate::ledger::types::{Identity, MeasurementRecord, RecordAction, RecordState};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Known record layouts, oldest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    /// temperature and humidity only
    V1,
    /// adds conductivity, weight, volume and stock
    V2,
    /// canonical: adds density, pH and color
    V3,
}

impl SchemaVersion {
    pub const CURRENT: SchemaVersion = SchemaVersion::V3;

    pub fn number(&self) -> u32 {
        match self {
            SchemaVersion::V1 => 1,
            SchemaVersion::V2 => 2,
            SchemaVersion::V3 => 3,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

impl FromStr for SchemaVersion {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().trim_start_matches('v') {
            "1" => Ok(SchemaVersion::V1),
            "2" => Ok(SchemaVersion::V2),
            "3" => Ok(SchemaVersion::V3),
            _ => Err(LedgerError::UnknownVariant {
                kind: "schema",
                value: s.to_string(),
            }),
        }
    }
}

/// Record as seen by v1 consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingV1 {
    pub timestamp: i64,
    pub source: Identity,
    pub temperature: i64,
    pub humidity: u64,
    pub state: RecordState,
    pub action: RecordAction,
}

impl From<&MeasurementRecord> for ReadingV1 {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            source: record.source.clone(),
            temperature: record.temperature,
            humidity: record.humidity,
            state: record.state,
            action: record.action,
        }
    }
}

/// Record as seen by v2 consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReadingV2 {
    pub timestamp: i64,
    pub source: Identity,
    pub temperature: i64,
    pub humidity: u64,
    pub conductivity: u64,
    pub weight: u64,
    pub volume: u64,
    pub available_stock: u64,
    pub state: RecordState,
    pub action: RecordAction,
}

impl From<&MeasurementRecord> for ReadingV2 {
    fn from(record: &MeasurementRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            source: record.source.clone(),
            temperature: record.temperature,
            humidity: record.humidity,
            conductivity: record.conductivity,
            weight: record.weight,
            volume: record.volume,
            available_stock: record.available_stock,
            state: record.state,
            action: record.action,
        }
    }
}

/// A record projected onto one schema version
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RecordView {
    V1(ReadingV1),
    V2(ReadingV2),
    V3(MeasurementRecord),
}

impl RecordView {
    pub fn project(record: &MeasurementRecord, schema: SchemaVersion) -> Self {
        match schema {
            SchemaVersion::V1 => RecordView::V1(record.into()),
            SchemaVersion::V2 => RecordView::V2(record.into()),
            SchemaVersion::V3 => RecordView::V3(record.clone()),
        }
    }

    pub fn schema(&self) -> SchemaVersion {
        match self {
            RecordView::V1(_) => SchemaVersion::V1,
            RecordView::V2(_) => SchemaVersion::V2,
            RecordView::V3(_) => SchemaVersion::V3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::RecordFields;

    fn sample() -> MeasurementRecord {
        MeasurementRecord::from_fields(
            RecordFields::new()
                .temperature(-4)
                .humidity(55)
                .conductivity(12)
                .stock(300)
                .ph(7)
                .state(RecordState::Normal),
            Identity::new("gateway"),
            1_000,
        )
    }

    #[test]
    fn test_schema_parsing() {
        assert_eq!("v1".parse::<SchemaVersion>().unwrap(), SchemaVersion::V1);
        assert_eq!("2".parse::<SchemaVersion>().unwrap(), SchemaVersion::V2);
        assert_eq!("V3".parse::<SchemaVersion>().unwrap(), SchemaVersion::V3);
        assert!("v4".parse::<SchemaVersion>().is_err());
        assert_eq!(SchemaVersion::CURRENT.to_string(), "v3");
    }

    #[test]
    fn test_v1_projection_drops_newer_fields() {
        let view = RecordView::project(&sample(), SchemaVersion::V1);
        let json = serde_json::to_value(&view).unwrap();

        assert_eq!(json["temperature"], -4);
        assert_eq!(json["humidity"], 55);
        assert!(json.get("available_stock").is_none());
        assert!(json.get("ph").is_none());
    }

    #[test]
    fn test_v2_projection_keeps_stock() {
        let view = RecordView::project(&sample(), SchemaVersion::V2);
        assert_eq!(view.schema(), SchemaVersion::V2);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["available_stock"], 300);
        assert_eq!(json["conductivity"], 12);
        assert!(json.get("density").is_none());
    }

    #[test]
    fn test_v3_projection_is_canonical() {
        let record = sample();
        assert_eq!(
            RecordView::project(&record, SchemaVersion::V3),
            RecordView::V3(record)
        );
    }
}
