//! Closed set of logical column types.
//!
//! The catalog reports free-form type names; they are mapped once, at schema
//! load time, onto [`LogicalType`]. Everything downstream dispatches on the
//! tag.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Date/time flavours distinguished by the coercion layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Timestamp,
    TimestampTz,
    Date,
    Time,
    TimeTz,
}

/// Storage width of an integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegerWidth {
    Small,
    Regular,
    Big,
}

impl IntegerWidth {
    /// Whether `value` fits the column without overflowing on the server.
    pub fn contains(self, value: i64) -> bool {
        match self {
            IntegerWidth::Small => i16::try_from(value).is_ok(),
            IntegerWidth::Regular => i32::try_from(value).is_ok(),
            IntegerWidth::Big => true,
        }
    }
}

/// Logical type of a target column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalType {
    Integer(IntegerWidth),
    Decimal,
    Boolean,
    Temporal(TemporalKind),
    /// Text and every type without a dedicated coercion; values pass through.
    Text,
}

impl LogicalType {
    /// Map a catalog `data_type` onto a logical type.
    pub fn from_catalog(data_type: &str) -> Self {
        match data_type.trim().to_ascii_lowercase().as_str() {
            "smallint" => Self::Integer(IntegerWidth::Small),
            "integer" => Self::Integer(IntegerWidth::Regular),
            "bigint" => Self::Integer(IntegerWidth::Big),
            "numeric" | "decimal" | "real" | "double precision" => Self::Decimal,
            "boolean" => Self::Boolean,
            "timestamp without time zone" => Self::Temporal(TemporalKind::Timestamp),
            "timestamp with time zone" => Self::Temporal(TemporalKind::TimestampTz),
            "date" => Self::Temporal(TemporalKind::Date),
            "time without time zone" => Self::Temporal(TemporalKind::Time),
            "time with time zone" => Self::Temporal(TemporalKind::TimeTz),
            _ => Self::Text,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integer(IntegerWidth::Small) => "smallint",
            Self::Integer(IntegerWidth::Regular) => "integer",
            Self::Integer(IntegerWidth::Big) => "bigint",
            Self::Decimal => "decimal",
            Self::Boolean => "boolean",
            Self::Temporal(TemporalKind::Timestamp) => "timestamp",
            Self::Temporal(TemporalKind::TimestampTz) => "timestamptz",
            Self::Temporal(TemporalKind::Date) => "date",
            Self::Temporal(TemporalKind::Time) => "time",
            Self::Temporal(TemporalKind::TimeTz) => "timetz",
            Self::Text => "text",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer(_) | Self::Decimal)
    }
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
