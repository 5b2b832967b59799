//! Target-table column schema.

use godam_db::{CatalogColumn, TableRef, UpsertColumn};
use serde::Serialize;

use crate::error::{Result, SchemaError};
use crate::types::LogicalType;

/// Columns every GoDam stock table must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "part_number",
    "warehouse_no",
    "sap_pn",
    "description",
    "qty",
    "vendor_name",
];

pub const PART_NUMBER_COLUMN: &str = "part_number";
pub const WAREHOUSE_NO_COLUMN: &str = "warehouse_no";
pub const QUANTITY_COLUMN: &str = "qty";

/// Parse a `[schema.]table` identifier supplied by the operator.
pub fn parse_table_name(identifier: &str) -> Result<TableRef> {
    TableRef::parse(identifier).map_err(|_| SchemaError::InvalidTableName(identifier.to_string()))
}

/// One target column with its logical type resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSchema {
    pub name: String,
    pub nullable: bool,
    pub logical_type: LogicalType,
    /// Catalog spelling of the type, used in violation messages.
    pub declared_type: String,
    pub udt_schema: String,
    pub udt_name: String,
    pub max_length: Option<i32>,
    pub precision: Option<i32>,
}

impl ColumnSchema {
    pub fn from_catalog(column: CatalogColumn) -> Self {
        Self {
            logical_type: LogicalType::from_catalog(&column.data_type),
            name: column.name,
            nullable: column.nullable,
            declared_type: column.data_type,
            udt_schema: column.udt_schema,
            udt_name: column.udt_name,
            max_length: column.max_length,
            precision: column.precision,
        }
    }

    /// Case-insensitive name match.
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Column positions of the business key and quantity field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyColumns {
    pub part_number: usize,
    pub warehouse_no: usize,
    pub quantity: usize,
}

/// Ordered column list of the target table.
#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    pub table: TableRef,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn new(table: TableRef, columns: Vec<ColumnSchema>) -> Self {
        Self { table, columns }
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Position of `name`, matched case-insensitively.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.is_named(name))
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.position(name).map(|idx| &self.columns[idx])
    }

    /// Fail unless every name in `required` is present.
    pub fn require_columns(&self, required: &[&str]) -> Result<()> {
        let mut missing: Vec<String> = required
            .iter()
            .filter(|name| self.position(name).is_none())
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            return Ok(());
        }
        missing.sort();
        Err(SchemaError::MissingRequiredColumns {
            table: self.table.to_string(),
            missing,
        })
    }

    /// Resolve business key and quantity positions.
    pub fn key_columns(&self) -> Result<KeyColumns> {
        self.require_columns(&[PART_NUMBER_COLUMN, WAREHOUSE_NO_COLUMN, QUANTITY_COLUMN])?;
        let position = |name| self.position(name).unwrap_or_default();
        Ok(KeyColumns {
            part_number: position(PART_NUMBER_COLUMN),
            warehouse_no: position(WAREHOUSE_NO_COLUMN),
            quantity: position(QUANTITY_COLUMN),
        })
    }

    /// Insert column list in schema order.
    pub fn upsert_columns(&self) -> Vec<UpsertColumn> {
        self.columns
            .iter()
            .map(|c| UpsertColumn::new(&c.name, &c.udt_schema, &c.udt_name))
            .collect()
    }
}
