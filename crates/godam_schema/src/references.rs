//! Foreign-key discovery and reference value sets.
//!
//! Every referenced column is loaded into memory once so the per-cell check
//! is a set lookup, never a query per row.

use godam_db::{CatalogSession, TableRef};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

use crate::cell::CellValue;
use crate::error::Result;
use crate::table::TableSchema;

/// A column of the target table bound to a referenced column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyRef {
    pub column: String,
    pub target: TableRef,
    pub target_column: String,
}

impl ForeignKeyRef {
    /// `table.column` as shown in violation messages.
    pub fn describe(&self) -> String {
        format!("{}.{}", self.target.name, self.target_column)
    }
}

/// Discover the FK columns of `table`. The first mapping per column wins.
pub async fn load_foreign_keys<S>(session: &mut S, table: &TableRef) -> Result<Vec<ForeignKeyRef>>
where
    S: CatalogSession + ?Sized,
{
    let mut seen = HashSet::new();
    let refs: Vec<ForeignKeyRef> = session
        .foreign_keys(table)
        .await?
        .into_iter()
        .filter(|fk| seen.insert(fk.column.clone()))
        .map(|fk| ForeignKeyRef {
            column: fk.column,
            target: fk.target,
            target_column: fk.target_column,
        })
        .collect();

    info!(table = %table, foreign_keys = refs.len(), "Discovered foreign keys");
    Ok(refs)
}

/// Values present in one referenced column, converted to the source
/// column's logical type.
#[derive(Debug, Clone)]
pub struct ReferenceSet {
    pub foreign_key: ForeignKeyRef,
    values: HashSet<CellValue>,
}

impl ReferenceSet {
    pub fn new(foreign_key: ForeignKeyRef, values: impl IntoIterator<Item = CellValue>) -> Self {
        Self {
            foreign_key,
            values: values.into_iter().filter(|v| !v.is_null()).collect(),
        }
    }

    pub fn contains(&self, value: &CellValue) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Reference sets keyed by source column name.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSets {
    enabled: bool,
    by_column: HashMap<String, ReferenceSet>,
}

impl ReferenceSets {
    /// FK checking switched off: every value passes.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            by_column: HashMap::new(),
        }
    }

    pub fn from_sets(sets: impl IntoIterator<Item = ReferenceSet>) -> Self {
        Self {
            enabled: true,
            by_column: sets
                .into_iter()
                .map(|set| (set.foreign_key.column.clone(), set))
                .collect(),
        }
    }

    /// Materialize the value set behind every foreign key.
    pub async fn load<S>(
        session: &mut S,
        schema: &TableSchema,
        foreign_keys: &[ForeignKeyRef],
    ) -> Result<Self>
    where
        S: CatalogSession + ?Sized,
    {
        let mut sets = Vec::with_capacity(foreign_keys.len());
        for fk in foreign_keys {
            let Some(column) = schema.columns.iter().find(|c| c.name == fk.column) else {
                warn!(column = %fk.column, "Foreign key column not in table schema; skipping");
                continue;
            };

            let rows = session
                .scan_columns(&fk.target, &[fk.target_column.as_str()])
                .await?;

            let mut unconvertible = 0usize;
            let values: Vec<CellValue> = rows
                .into_iter()
                .filter_map(|mut row| row.pop().flatten())
                .filter_map(|text| match column.logical_type.coerce_text(&text) {
                    Ok(value) => Some(value),
                    Err(_) => {
                        unconvertible += 1;
                        None
                    }
                })
                .collect();

            if unconvertible > 0 {
                warn!(
                    column = %fk.column,
                    reference = %fk.describe(),
                    unconvertible,
                    "Reference values not representable in the source column type"
                );
            }

            let set = ReferenceSet::new(fk.clone(), values);
            info!(
                column = %fk.column,
                reference = %fk.describe(),
                values = set.len(),
                "Loaded reference values"
            );
            sets.push(set);
        }

        Ok(Self::from_sets(sets))
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn get(&self, column: &str) -> Option<&ReferenceSet> {
        self.by_column.get(column)
    }

    /// The violated foreign key when `value` is absent from the reference
    /// set of `column`. Null values and disabled checking always pass.
    pub fn missing_reference(&self, column: &str, value: &CellValue) -> Option<&ForeignKeyRef> {
        if !self.enabled || value.is_null() {
            return None;
        }
        let set = self.by_column.get(column)?;
        if set.contains(value) {
            None
        } else {
            Some(&set.foreign_key)
        }
    }

    pub fn len(&self) -> usize {
        self.by_column.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_column.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor_fk() -> ForeignKeyRef {
        ForeignKeyRef {
            column: "vendor_name".to_string(),
            target: TableRef::new("public", "vendors"),
            target_column: "name".to_string(),
        }
    }

    #[test]
    fn missing_reference_reports_fk() {
        let sets = ReferenceSets::from_sets([ReferenceSet::new(
            vendor_fk(),
            [CellValue::Text("ACME".to_string())],
        )]);

        assert!(sets
            .missing_reference("vendor_name", &CellValue::Text("ACME".to_string()))
            .is_none());
        let fk = sets
            .missing_reference("vendor_name", &CellValue::Text("Globex".to_string()))
            .unwrap();
        assert_eq!(fk.describe(), "vendors.name");
    }

    #[test]
    fn disabled_sets_pass_everything() {
        let sets = ReferenceSets::disabled();
        assert!(!sets.is_enabled());
        assert!(sets
            .missing_reference("vendor_name", &CellValue::Text("anything".to_string()))
            .is_none());
    }

    #[test]
    fn columns_without_fk_and_nulls_pass() {
        let sets = ReferenceSets::from_sets([ReferenceSet::new(vendor_fk(), [])]);
        assert!(sets
            .missing_reference("description", &CellValue::Text("x".to_string()))
            .is_none());
        assert!(sets.missing_reference("vendor_name", &CellValue::Null).is_none());
    }
}
