//! Numeric record fields
//!
//! Each field belongs to a numeric domain. Temperature is signed; every
//! other measurement is unsigned.

use crate::ledger::{LedgerError, MeasurementRecord};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Signedness of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericDomain {
    Signed,
    Unsigned,
}

/// Aggregatable measurement field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Temperature,
    Humidity,
    Density,
    Conductivity,
    Weight,
    Volume,
    Ph,
    Color,
    AvailableStock,
}

impl Field {
    pub fn all() -> &'static [Field] {
        &[
            Field::Temperature,
            Field::Humidity,
            Field::Density,
            Field::Conductivity,
            Field::Weight,
            Field::Volume,
            Field::Ph,
            Field::Color,
            Field::AvailableStock,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Field::Temperature => "temperature",
            Field::Humidity => "humidity",
            Field::Density => "density",
            Field::Conductivity => "conductivity",
            Field::Weight => "weight",
            Field::Volume => "volume",
            Field::Ph => "ph",
            Field::Color => "color",
            Field::AvailableStock => "available_stock",
        }
    }

    pub fn domain(&self) -> NumericDomain {
        match self {
            Field::Temperature => NumericDomain::Signed,
            _ => NumericDomain::Unsigned,
        }
    }

    pub fn value_of(&self, record: &MeasurementRecord) -> FieldValue {
        match self {
            Field::Temperature => FieldValue::Signed(record.temperature),
            Field::Humidity => FieldValue::Unsigned(record.humidity),
            Field::Density => FieldValue::Unsigned(record.density),
            Field::Conductivity => FieldValue::Unsigned(record.conductivity),
            Field::Weight => FieldValue::Unsigned(record.weight),
            Field::Volume => FieldValue::Unsigned(record.volume),
            Field::Ph => FieldValue::Unsigned(record.ph),
            Field::Color => FieldValue::Unsigned(record.color),
            Field::AvailableStock => FieldValue::Unsigned(record.available_stock),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "temperature" => Ok(Field::Temperature),
            "humidity" => Ok(Field::Humidity),
            "density" => Ok(Field::Density),
            "conductivity" => Ok(Field::Conductivity),
            "weight" => Ok(Field::Weight),
            "volume" => Ok(Field::Volume),
            "ph" => Ok(Field::Ph),
            "color" => Ok(Field::Color),
            "available_stock" | "stock" => Ok(Field::AvailableStock),
            _ => Err(LedgerError::UnknownVariant {
                kind: "field",
                value: s.to_string(),
            }),
        }
    }
}

/// A value in a field's own domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Signed(i64),
    Unsigned(u64),
}

impl FieldValue {
    pub fn domain(&self) -> NumericDomain {
        match self {
            FieldValue::Signed(_) => NumericDomain::Signed,
            FieldValue::Unsigned(_) => NumericDomain::Unsigned,
        }
    }

    pub fn widen(&self) -> i128 {
        match *self {
            FieldValue::Signed(v) => v as i128,
            FieldValue::Unsigned(v) => v as i128,
        }
    }

    /// Narrow `value` back into `domain`; `value` must already lie within it
    pub(crate) fn narrow(domain: NumericDomain, value: i128) -> Self {
        match domain {
            NumericDomain::Signed => FieldValue::Signed(value as i64),
            NumericDomain::Unsigned => FieldValue::Unsigned(value as u64),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Signed(v) => write!(f, "{}", v),
            FieldValue::Unsigned(v) => write!(f, "{}", v),
        }
    }
}
