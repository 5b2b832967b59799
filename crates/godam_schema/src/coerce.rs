//! Per-type coercion of normalized input cells.
//!
//! Each logical type has exactly one coercion function. Callers pass an
//! already-normalized cell (see [`crate::normalize_cell`]); null handling
//! happens before coercion.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc};
use thiserror::Error;

use crate::cell::{CellValue, RawCell};
use crate::types::{IntegerWidth, LogicalType, TemporalKind};

/// A value that cannot be represented in the requested logical type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {0}")]
pub struct CoerceError(pub LogicalType);

const TRUE_WORDS: &[&str] = &["true", "t", "yes", "1"];
const FALSE_WORDS: &[&str] = &["false", "f", "no", "0"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S%.f",
    "%d/%m/%Y %H:%M",
    "%d.%m.%Y %H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
];

const OFFSET_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
    "%Y-%m-%d %H:%M:%S%.f %#z",
];

// Month-first before day-first for ambiguous slash dates.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d.%m.%Y",
    "%d-%b-%Y",
    "%d %b %Y",
    "%b %d, %Y",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

impl LogicalType {
    /// Convert a normalized cell into this type.
    pub fn coerce(&self, cell: &RawCell) -> Result<CellValue, CoerceError> {
        let coerced = match self {
            LogicalType::Integer(width) => coerce_integer(*width, cell),
            LogicalType::Decimal => coerce_decimal(cell),
            LogicalType::Boolean => coerce_boolean(cell),
            LogicalType::Temporal(kind) => coerce_temporal(*kind, cell),
            LogicalType::Text => Some(coerce_text_cell(cell)),
        };
        coerced.ok_or(CoerceError(*self))
    }

    /// Convert catalog text (as returned by a `::text` scan) into this type.
    pub fn coerce_text(&self, text: &str) -> Result<CellValue, CoerceError> {
        self.coerce(&RawCell::Text(text.trim().to_string()))
    }
}

fn coerce_integer(width: IntegerWidth, cell: &RawCell) -> Option<CellValue> {
    let value = match cell {
        RawCell::Int(v) => *v,
        RawCell::Float(v) if v.is_finite() && v.fract() == 0.0 => {
            if *v < i64::MIN as f64 || *v >= i64::MAX as f64 {
                return None;
            }
            *v as i64
        }
        RawCell::Bool(v) => i64::from(*v),
        RawCell::Text(text) => text.trim().parse::<i64>().ok()?,
        _ => return None,
    };
    width.contains(value).then_some(CellValue::Integer(value))
}

// Spreadsheet numbers in a text column are rendered the way they are bound,
// so 12345.0 compares equal to the catalog text "12345".
fn coerce_text_cell(cell: &RawCell) -> CellValue {
    match CellValue::from(cell.clone()) {
        CellValue::Text(text) => CellValue::Text(text),
        other => other
            .to_sql_text()
            .map(CellValue::Text)
            .unwrap_or(CellValue::Null),
    }
}

fn coerce_decimal(cell: &RawCell) -> Option<CellValue> {
    let value = match cell {
        RawCell::Int(v) => *v as f64,
        RawCell::Float(v) => *v,
        RawCell::Bool(v) => {
            if *v {
                1.0
            } else {
                0.0
            }
        }
        RawCell::Text(text) => text.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    Some(CellValue::Decimal(value))
}

fn coerce_boolean(cell: &RawCell) -> Option<CellValue> {
    let text = match cell {
        RawCell::Bool(v) => return Some(CellValue::Boolean(*v)),
        RawCell::Int(v) => v.to_string(),
        RawCell::Float(v) if *v == 0.0 || *v == 1.0 => format!("{:.0}", v),
        RawCell::Text(text) => text.trim().to_lowercase(),
        _ => return None,
    };

    if TRUE_WORDS.contains(&text.as_str()) {
        Some(CellValue::Boolean(true))
    } else if FALSE_WORDS.contains(&text.as_str()) {
        Some(CellValue::Boolean(false))
    } else {
        None
    }
}

fn coerce_temporal(kind: TemporalKind, cell: &RawCell) -> Option<CellValue> {
    match cell {
        RawCell::DateTime(dt) => Some(from_naive(kind, *dt)),
        RawCell::Text(text) => parse_temporal(kind, text.trim()),
        _ => None,
    }
}

fn from_naive(kind: TemporalKind, dt: NaiveDateTime) -> CellValue {
    match kind {
        TemporalKind::Timestamp => CellValue::Timestamp(dt),
        TemporalKind::TimestampTz => CellValue::TimestampTz(utc_fixed(dt)),
        TemporalKind::Date => CellValue::Date(dt.date()),
        TemporalKind::Time => CellValue::Time(dt.time()),
        TemporalKind::TimeTz => CellValue::TimeTz(dt.time(), utc_offset()),
    }
}

fn parse_temporal(kind: TemporalKind, text: &str) -> Option<CellValue> {
    match kind {
        TemporalKind::Timestamp => {
            if let Some(dt) = parse_naive_datetime(text) {
                return Some(CellValue::Timestamp(dt));
            }
            // Offsets are dropped for zone-less columns; wall time is kept.
            parse_offset_datetime(text).map(|dt| CellValue::Timestamp(dt.naive_local()))
        }
        TemporalKind::TimestampTz => {
            if let Some(dt) = parse_offset_datetime(text) {
                return Some(CellValue::TimestampTz(dt));
            }
            parse_naive_datetime(text).map(|dt| CellValue::TimestampTz(utc_fixed(dt)))
        }
        TemporalKind::Date => {
            if let Some(date) = parse_date(text) {
                return Some(CellValue::Date(date));
            }
            parse_naive_datetime(text)
                .or_else(|| parse_offset_datetime(text).map(|dt| dt.naive_local()))
                .map(|dt| CellValue::Date(dt.date()))
        }
        TemporalKind::Time => {
            if let Some(time) = parse_time(text) {
                return Some(CellValue::Time(time));
            }
            parse_naive_datetime(text).map(|dt| CellValue::Time(dt.time()))
        }
        TemporalKind::TimeTz => parse_time_with_offset(text)
            .or_else(|| parse_time(text).map(|time| (time, utc_offset())))
            .map(|(time, offset)| CellValue::TimeTz(time, offset)),
    }
}

fn parse_naive_datetime(text: &str) -> Option<NaiveDateTime> {
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    parse_date(text).and_then(|date| date.and_hms_opt(0, 0, 0))
}

fn parse_offset_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = match text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        Some(stripped) => format!("{}+00:00", stripped),
        None => text.to_string(),
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt);
    }
    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&text, format) {
            return Some(dt);
        }
    }
    None
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(text, format).ok())
}

fn parse_time_with_offset(text: &str) -> Option<(NaiveTime, FixedOffset)> {
    if let Some(time) = text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        return parse_time(time.trim()).map(|t| (t, utc_offset()));
    }
    let split = text.rfind(|c: char| c == '+' || c == '-')?;
    let (time, offset) = text.split_at(split);
    Some((parse_time(time.trim())?, parse_offset(offset)?))
}

/// Parse `+HH`, `+HHMM` or `+HH:MM` (and the `-` forms).
fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, digits) = match text.split_at(1) {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let digits: String = digits.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

fn utc_fixed(dt: NaiveDateTime) -> DateTime<FixedOffset> {
    dt.and_utc().fixed_offset()
}
