//! Per-row conversion and validation.

use godam_schema::{
    normalize_cell, CellValue, ColumnSchema, KeyColumns, LogicalType, RawCell, RawRow,
    ReferenceSets, Result, TableSchema,
};

use crate::violation::Violation;

/// A row after conversion: one value per schema column plus every problem
/// found. A row with violations is never ingested.
#[derive(Debug, Clone)]
pub struct ValidatedRow {
    pub line: usize,
    /// Converted value per schema column; the supplied value when conversion
    /// failed.
    pub values: Vec<CellValue>,
    pub violations: Vec<Violation>,
}

impl ValidatedRow {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }

    /// Rebuild an input row from the converted values.
    pub fn to_raw_row(&self, schema: &TableSchema) -> RawRow {
        let mut row = RawRow::new(self.line);
        for (column, value) in schema.columns.iter().zip(&self.values) {
            let cell = match value.to_sql_text() {
                Some(text) => RawCell::Text(text),
                None => RawCell::Empty,
            };
            row.insert(column.name.clone(), cell);
        }
        row
    }
}

/// Validates rows against one schema snapshot and its reference sets.
#[derive(Debug)]
pub struct RowValidator<'a> {
    schema: &'a TableSchema,
    references: &'a ReferenceSets,
    keys: KeyColumns,
}

impl<'a> RowValidator<'a> {
    /// Fails if the schema lacks the business key or quantity column.
    pub fn new(schema: &'a TableSchema, references: &'a ReferenceSets) -> Result<Self> {
        Ok(Self {
            keys: schema.key_columns()?,
            schema,
            references,
        })
    }

    pub fn schema(&self) -> &TableSchema {
        self.schema
    }

    pub fn key_columns(&self) -> KeyColumns {
        self.keys
    }

    /// Convert every column of `row`, accumulating violations.
    pub fn validate_row(&self, row: &RawRow) -> ValidatedRow {
        let mut values = Vec::with_capacity(self.schema.columns.len());
        let mut violations = Vec::new();

        for (idx, column) in self.schema.columns.iter().enumerate() {
            let value = self.validate_cell(idx, column, row.get(&column.name), &mut violations);
            values.push(value);
        }

        ValidatedRow {
            line: row.line,
            values,
            violations,
        }
    }

    fn validate_cell(
        &self,
        idx: usize,
        column: &ColumnSchema,
        raw: Option<&RawCell>,
        violations: &mut Vec<Violation>,
    ) -> CellValue {
        let Some(cell) = normalize_cell(raw) else {
            if !column.nullable {
                violations.push(Violation::Required {
                    column: column.name.clone(),
                });
            }
            return CellValue::Null;
        };

        let (value, converted) = match column.logical_type.coerce(&cell) {
            Ok(value) => (value, true),
            Err(_) => {
                violations.push(Violation::InvalidType {
                    column: column.name.clone(),
                    declared_type: column.declared_type.clone(),
                });
                (CellValue::from(cell), false)
            }
        };

        if idx == self.keys.quantity && value.as_f64().is_some_and(|v| v < 0.0) {
            violations.push(Violation::Negative {
                column: column.name.clone(),
            });
        }

        if let (LogicalType::Text, Some(max_length)) = (column.logical_type, column.max_length) {
            if let Some(text) = value.to_sql_text() {
                if text.chars().count() > max_length.max(0) as usize {
                    violations.push(Violation::TooLong {
                        column: column.name.clone(),
                        max_length,
                    });
                }
            }
        }

        // A value that failed conversion is not checked against references.
        if converted {
            if let Some(fk) = self.references.missing_reference(&column.name, &value) {
                violations.push(Violation::MissingReference {
                    column: column.name.clone(),
                    reference: fk.describe(),
                });
            }
        }

        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use godam_db::{CatalogColumn, TableRef};
    use godam_schema::{ForeignKeyRef, ReferenceSet};

    fn schema() -> TableSchema {
        TableSchema::new(
            TableRef::new("public", "stock"),
            vec![
                CatalogColumn::builtin("part_number", "text", "text", false),
                CatalogColumn::builtin("warehouse_no", "text", "text", false),
                CatalogColumn::builtin("qty", "integer", "int4", true),
                CatalogColumn::builtin("active", "boolean", "bool", true),
                CatalogColumn::builtin("vendor_name", "character varying", "varchar", true)
                    .with_max_length(5),
            ]
            .into_iter()
            .map(ColumnSchema::from_catalog)
            .collect(),
        )
    }

    fn vendors() -> ReferenceSets {
        ReferenceSets::from_sets([ReferenceSet::new(
            ForeignKeyRef {
                column: "vendor_name".into(),
                target: TableRef::new("public", "vendors"),
                target_column: "name".into(),
            },
            [CellValue::Text("ACME".into())],
        )])
    }

    fn messages(row: &ValidatedRow) -> Vec<String> {
        row.violations.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn converts_typed_values() {
        let schema = schema();
        let refs = vendors();
        let validator = RowValidator::new(&schema, &refs).unwrap();
        let row = validator.validate_row(&RawRow::from_pairs(
            2,
            [
                ("part_number", " P1 "),
                ("warehouse_no", "W1"),
                ("qty", "123"),
                ("active", "Yes"),
                ("vendor_name", "ACME"),
            ],
        ));

        assert!(row.is_valid(), "{:?}", row.violations);
        assert_eq!(row.values[0], CellValue::Text("P1".into()));
        assert_eq!(row.values[2], CellValue::Integer(123));
        assert_eq!(row.values[3], CellValue::Boolean(true));
    }

    #[test]
    fn violations_accumulate_and_keep_supplied_value() {
        let schema = schema();
        let refs = vendors();
        let validator = RowValidator::new(&schema, &refs).unwrap();
        let row = validator.validate_row(&RawRow::from_pairs(
            3,
            [("warehouse_no", "   "), ("qty", "abc"), ("active", "maybe")],
        ));

        assert_eq!(
            messages(&row),
            vec![
                "part_number is required",
                "warehouse_no is required",
                "qty: invalid integer",
                "active: invalid boolean",
            ]
        );
        assert_eq!(row.values[2], CellValue::Text("abc".into()));
        assert_eq!(row.values[1], CellValue::Null);
    }

    #[test]
    fn empty_nullable_cell_is_null_without_violation() {
        let schema = schema();
        let refs = ReferenceSets::disabled();
        let validator = RowValidator::new(&schema, &refs).unwrap();
        let row = validator.validate_row(&RawRow::from_pairs(
            4,
            [("part_number", "P1"), ("warehouse_no", "W1"), ("qty", "")],
        ));
        assert!(row.is_valid());
        assert_eq!(row.values[2], CellValue::Null);
    }

    #[test]
    fn negative_quantity_is_flagged_after_conversion() {
        let schema = schema();
        let refs = ReferenceSets::disabled();
        let validator = RowValidator::new(&schema, &refs).unwrap();
        let row = validator.validate_row(&RawRow::from_pairs(
            5,
            [("part_number", "P1"), ("warehouse_no", "W1"), ("qty", "-3")],
        ));
        assert_eq!(messages(&row), vec!["qty: value cannot be negative"]);
        assert_eq!(row.values[2], CellValue::Integer(-3));
    }

    #[test]
    fn fk_miss_and_length_are_reported() {
        let schema = schema();
        let refs = vendors();
        let validator = RowValidator::new(&schema, &refs).unwrap();
        let row = validator.validate_row(&RawRow::from_pairs(
            6,
            [
                ("part_number", "P1"),
                ("warehouse_no", "W1"),
                ("vendor_name", "Globex"),
            ],
        ));
        assert_eq!(
            messages(&row),
            vec![
                "vendor_name: exceeds max length 5",
                "vendor_name: missing FK vendors.name",
            ]
        );

        let unchecked = ReferenceSets::disabled();
        let validator = RowValidator::new(&schema, &unchecked).unwrap();
        let row = validator.validate_row(&RawRow::from_pairs(
            6,
            [("part_number", "P1"), ("warehouse_no", "W1"), ("vendor_name", "Init")],
        ));
        assert!(row.is_valid());
    }

    #[test]
    fn numeric_cells_in_text_columns_match_text_references() {
        let schema = schema();
        let refs = ReferenceSets::from_sets([ReferenceSet::new(
            ForeignKeyRef {
                column: "vendor_name".into(),
                target: TableRef::new("public", "vendors"),
                target_column: "name".into(),
            },
            [CellValue::Text("12345".into())],
        )]);
        let validator = RowValidator::new(&schema, &refs).unwrap();
        let row = validator.validate_row(&RawRow::from_pairs(
            7,
            [
                ("part_number", RawCell::from("P1")),
                ("warehouse_no", RawCell::Int(7)),
                ("vendor_name", RawCell::Float(12345.0)),
            ],
        ));

        assert!(row.is_valid(), "{:?}", row.violations);
        assert_eq!(row.values[1], CellValue::Text("7".into()));
        assert_eq!(row.values[4], CellValue::Text("12345".into()));
    }

    #[test]
    fn integer_outside_column_width_is_invalid() {
        let schema = TableSchema::new(
            TableRef::new("public", "stock"),
            vec![
                CatalogColumn::builtin("part_number", "text", "text", false),
                CatalogColumn::builtin("warehouse_no", "text", "text", false),
                CatalogColumn::builtin("qty", "smallint", "int2", true),
            ]
            .into_iter()
            .map(ColumnSchema::from_catalog)
            .collect(),
        );
        let refs = ReferenceSets::disabled();
        let validator = RowValidator::new(&schema, &refs).unwrap();

        let row = validator.validate_row(&RawRow::from_pairs(
            8,
            [("part_number", "P1"), ("warehouse_no", "W1"), ("qty", "99999")],
        ));
        assert_eq!(messages(&row), vec!["qty: invalid smallint"]);
        assert_eq!(row.values[2], CellValue::Text("99999".into()));

        let row = validator.validate_row(&RawRow::from_pairs(
            9,
            [("part_number", "P1"), ("warehouse_no", "W1"), ("qty", "32767")],
        ));
        assert!(row.is_valid());
    }

    #[test]
    fn validator_requires_key_columns() {
        let schema = TableSchema::new(
            TableRef::new("public", "stock"),
            vec![ColumnSchema::from_catalog(CatalogColumn::builtin(
                "part_number",
                "text",
                "text",
                false,
            ))],
        );
        let refs = ReferenceSets::disabled();
        assert!(RowValidator::new(&schema, &refs).is_err());
    }
}
