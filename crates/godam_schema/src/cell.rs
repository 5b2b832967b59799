//! Raw input cells and converted column values.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A cell as produced by the spreadsheet/CSV reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawCell {
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
}

impl From<&str> for RawCell {
    fn from(v: &str) -> Self {
        RawCell::Text(v.to_string())
    }
}

impl From<String> for RawCell {
    fn from(v: String) -> Self {
        RawCell::Text(v)
    }
}

impl From<i64> for RawCell {
    fn from(v: i64) -> Self {
        RawCell::Int(v)
    }
}

impl From<f64> for RawCell {
    fn from(v: f64) -> Self {
        RawCell::Float(v)
    }
}

impl From<bool> for RawCell {
    fn from(v: bool) -> Self {
        RawCell::Bool(v)
    }
}

/// Trim text, and map empty text, empty cells and NaN to `None`.
pub fn normalize_cell(cell: Option<&RawCell>) -> Option<RawCell> {
    match cell? {
        RawCell::Empty => None,
        RawCell::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(RawCell::Text(trimmed.to_string()))
            }
        }
        RawCell::Float(v) if v.is_nan() => None,
        other => Some(other.clone()),
    }
}

/// One input record. Values are addressed by header name.
#[derive(Debug, Clone, Default)]
pub struct RawRow {
    /// 1-based line in the source file (header is line 1).
    pub line: usize,
    cells: HashMap<String, RawCell>,
}

impl RawRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            cells: HashMap::new(),
        }
    }

    /// Build a row from `(header, cell)` pairs. The first occurrence of a
    /// header wins.
    pub fn from_pairs<K, V>(line: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<RawCell>,
    {
        let mut row = Self::new(line);
        for (key, value) in pairs {
            row.insert(key, value.into());
        }
        row
    }

    /// Insert unless the header is already present.
    pub fn insert(&mut self, header: impl Into<String>, cell: RawCell) {
        self.cells.entry(header.into()).or_insert(cell);
    }

    /// Cell for `header`; `None` when the column is missing.
    pub fn get(&self, header: &str) -> Option<&RawCell> {
        self.cells.get(header)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// A value converted to the target column's logical type.
#[derive(Debug, Clone)]
pub enum CellValue {
    Null,
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
    Date(NaiveDate),
    Time(NaiveTime),
    TimeTz(NaiveTime, FixedOffset),
    Text(String),
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    /// Numeric view of the value, if it has one. Text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Integer(v) => Some(*v as f64),
            CellValue::Decimal(v) => Some(*v),
            CellValue::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Text form used for SQL parameters and reports. `None` for null.
    pub fn to_sql_text(&self) -> Option<String> {
        let text = match self {
            CellValue::Null => return None,
            CellValue::Integer(v) => v.to_string(),
            CellValue::Decimal(v) => format_decimal(*v),
            CellValue::Boolean(v) => v.to_string(),
            CellValue::Timestamp(v) => v.format("%Y-%m-%d %H:%M:%S%.f").to_string(),
            CellValue::TimestampTz(v) => v.to_rfc3339(),
            CellValue::Date(v) => v.format("%Y-%m-%d").to_string(),
            CellValue::Time(v) => v.format("%H:%M:%S%.f").to_string(),
            CellValue::TimeTz(time, offset) => {
                format!("{}{}", time.format("%H:%M:%S%.f"), offset)
            }
            CellValue::Text(v) => v.clone(),
        };
        Some(text)
    }
}

impl From<RawCell> for CellValue {
    /// Pass-through conversion used for text columns and failed coercions.
    fn from(cell: RawCell) -> Self {
        match cell {
            RawCell::Empty => CellValue::Null,
            RawCell::Text(v) => CellValue::Text(v),
            RawCell::Int(v) => CellValue::Integer(v),
            RawCell::Float(v) => CellValue::Decimal(v),
            RawCell::Bool(v) => CellValue::Boolean(v),
            RawCell::DateTime(v) => CellValue::Timestamp(v),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_sql_text() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "NULL"),
        }
    }
}

// Reference sets hash converted values, so equality must be total: floats
// compare by bit pattern with -0.0 folded onto 0.0.
impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        use CellValue::*;
        match (self, other) {
            (Null, Null) => true,
            (Integer(a), Integer(b)) => a == b,
            (Decimal(a), Decimal(b)) => canonical_bits(*a) == canonical_bits(*b),
            (Boolean(a), Boolean(b)) => a == b,
            (Timestamp(a), Timestamp(b)) => a == b,
            (TimestampTz(a), TimestampTz(b)) => a == b,
            (Date(a), Date(b)) => a == b,
            (Time(a), Time(b)) => a == b,
            (TimeTz(a, oa), TimeTz(b, ob)) => a == b && oa == ob,
            (Text(a), Text(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Null => {}
            CellValue::Integer(v) => v.hash(state),
            CellValue::Decimal(v) => canonical_bits(*v).hash(state),
            CellValue::Boolean(v) => v.hash(state),
            CellValue::Timestamp(v) => v.hash(state),
            CellValue::TimestampTz(v) => v.hash(state),
            CellValue::Date(v) => v.hash(state),
            CellValue::Time(v) => v.hash(state),
            CellValue::TimeTz(time, offset) => {
                time.hash(state);
                offset.local_minus_utc().hash(state);
            }
            CellValue::Text(v) => v.hash(state),
        }
    }
}

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Integral values print without a fractional part ("12" rather than "12.0").
fn format_decimal(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.0}", v)
    } else {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn normalize_trims_and_nulls_blank_text() {
        assert_eq!(
            normalize_cell(Some(&RawCell::from("  P1 "))),
            Some(RawCell::from("P1"))
        );
        assert_eq!(normalize_cell(Some(&RawCell::from("   "))), None);
        assert_eq!(normalize_cell(Some(&RawCell::Empty)), None);
        assert_eq!(normalize_cell(Some(&RawCell::Float(f64::NAN))), None);
        assert_eq!(normalize_cell(None), None);
    }

    #[test]
    fn raw_row_keeps_first_header_occurrence() {
        let row = RawRow::from_pairs(2, [("qty", "1"), ("qty", "2")]);
        assert_eq!(row.get("qty"), Some(&RawCell::from("1")));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn decimal_text_drops_integral_fraction() {
        assert_eq!(CellValue::Decimal(12.0).to_sql_text().as_deref(), Some("12"));
        assert_eq!(CellValue::Decimal(2.5).to_sql_text().as_deref(), Some("2.5"));
        assert_eq!(CellValue::Null.to_sql_text(), None);
    }

    #[test]
    fn decimal_zero_signs_hash_together() {
        let mut set = HashSet::new();
        set.insert(CellValue::Decimal(0.0));
        assert!(set.contains(&CellValue::Decimal(-0.0)));
        assert!(!set.contains(&CellValue::Integer(0)));
    }

    #[test]
    fn as_f64_parses_numeric_text() {
        assert_eq!(CellValue::Text("-3".to_string()).as_f64(), Some(-3.0));
        assert_eq!(CellValue::Text("abc".to_string()).as_f64(), None);
        assert_eq!(CellValue::Integer(4).as_f64(), Some(4.0));
    }
}
