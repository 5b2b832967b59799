//! Business keys and the existing-stock snapshot.

use godam_db::{CatalogSession, TableRef};
use std::collections::HashMap;
use std::fmt;
use tracing::info;

use crate::cell::CellValue;
use crate::error::Result;
use crate::table::{PART_NUMBER_COLUMN, QUANTITY_COLUMN, WAREHOUSE_NO_COLUMN};

/// The `(part_number, warehouse_no)` pair identifying a stock record.
///
/// Components are trimmed; case is preserved.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BusinessKey {
    pub part_number: String,
    pub warehouse_no: String,
}

impl BusinessKey {
    /// Build a key from raw text parts. `None` if either part is blank.
    pub fn from_text(part_number: Option<&str>, warehouse_no: Option<&str>) -> Option<Self> {
        Some(Self {
            part_number: normalize_key_part(part_number?)?,
            warehouse_no: normalize_key_part(warehouse_no?)?,
        })
    }

    /// Build a key from converted cell values.
    pub fn from_values(part_number: &CellValue, warehouse_no: &CellValue) -> Option<Self> {
        Self::from_text(
            part_number.to_sql_text().as_deref(),
            warehouse_no.to_sql_text().as_deref(),
        )
    }
}

impl fmt::Display for BusinessKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.part_number, self.warehouse_no)
    }
}

fn normalize_key_part(part: &str) -> Option<String> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Existing stock keys and their current quantity.
///
/// Advisory only: used to tell the operator which rows update an existing
/// record, never to reject a row.
#[derive(Debug, Clone, Default)]
pub struct ExistingKeyMap {
    quantities: HashMap<BusinessKey, Option<String>>,
}

impl ExistingKeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `stock_table` for every `(part_number, warehouse_no, qty)`.
    /// Rows with a blank key part are ignored.
    pub async fn load<S>(session: &mut S, stock_table: &TableRef) -> Result<Self>
    where
        S: CatalogSession + ?Sized,
    {
        let rows = session
            .scan_columns(
                stock_table,
                &[PART_NUMBER_COLUMN, WAREHOUSE_NO_COLUMN, QUANTITY_COLUMN],
            )
            .await?;

        let mut map = Self::new();
        for row in rows {
            let mut cells = row.into_iter();
            let part = cells.next().flatten();
            let warehouse = cells.next().flatten();
            let qty = cells.next().flatten();
            if let Some(key) = BusinessKey::from_text(part.as_deref(), warehouse.as_deref()) {
                map.insert(key, qty);
            }
        }

        info!(table = %stock_table, keys = map.len(), "Loaded existing stock snapshot");
        Ok(map)
    }

    pub fn insert(&mut self, key: BusinessKey, quantity: Option<String>) {
        self.quantities.insert(key, quantity);
    }

    pub fn contains(&self, key: &BusinessKey) -> bool {
        self.quantities.contains_key(key)
    }

    /// Current quantity as stored text. Outer `None`: key not present.
    pub fn get(&self, key: &BusinessKey) -> Option<Option<&str>> {
        self.quantities.get(key).map(|qty| qty.as_deref())
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_parts_are_trimmed_not_lowercased() {
        let key = BusinessKey::from_text(Some("  Ab-1 "), Some("W1")).unwrap();
        assert_eq!(key.part_number, "Ab-1");
        assert_ne!(key, BusinessKey::from_text(Some("ab-1"), Some("W1")).unwrap());
    }

    #[test]
    fn blank_or_missing_part_yields_no_key() {
        assert!(BusinessKey::from_text(Some("   "), Some("W1")).is_none());
        assert!(BusinessKey::from_text(Some("P1"), None).is_none());
        assert!(BusinessKey::from_values(&CellValue::Text("P1".into()), &CellValue::Null).is_none());
    }

    #[test]
    fn numeric_key_parts_render_as_integers() {
        let key =
            BusinessKey::from_values(&CellValue::Decimal(1200.0), &CellValue::Integer(7)).unwrap();
        assert_eq!(key.to_string(), "(1200, 7)");
    }

    #[test]
    fn existing_map_distinguishes_null_quantity_from_absent_key() {
        let mut map = ExistingKeyMap::new();
        let known = BusinessKey::from_text(Some("P1"), Some("W1")).unwrap();
        let null_qty = BusinessKey::from_text(Some("P2"), Some("W1")).unwrap();
        map.insert(known.clone(), Some("10".to_string()));
        map.insert(null_qty.clone(), None);

        assert_eq!(map.get(&known), Some(Some("10")));
        assert_eq!(map.get(&null_qty), Some(None));
        assert_eq!(
            map.get(&BusinessKey::from_text(Some("P3"), Some("W1")).unwrap()),
            None
        );
    }
}
