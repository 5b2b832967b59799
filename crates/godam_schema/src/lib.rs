//! Target-table schema and reference data for GoDam uploads.
//!
//! Everything here is loaded once per run, before any input row is looked at:
//!
//! - [`introspect`]: ordered column schema from the live catalog
//! - [`references`]: foreign-key discovery and in-memory reference value sets
//! - [`snapshot`]: business keys and the existing-stock snapshot
//! - [`types`] / [`coerce`]: the closed logical-type tags and one coercion
//!   function per tag
//! - [`cell`]: raw input cells and converted values

pub mod cell;
pub mod coerce;
pub mod error;
pub mod introspect;
pub mod references;
pub mod snapshot;
pub mod table;
pub mod types;

pub use cell::{normalize_cell, CellValue, RawCell, RawRow};
pub use coerce::CoerceError;
pub use error::{Result, SchemaError};
pub use introspect::load_table_schema;
pub use references::{load_foreign_keys, ForeignKeyRef, ReferenceSet, ReferenceSets};
pub use snapshot::{BusinessKey, ExistingKeyMap};
pub use table::{
    parse_table_name, ColumnSchema, KeyColumns, TableSchema, PART_NUMBER_COLUMN, QUANTITY_COLUMN,
    REQUIRED_COLUMNS, WAREHOUSE_NO_COLUMN,
};
pub use types::{IntegerWidth, LogicalType, TemporalKind};
