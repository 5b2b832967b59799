//! Schema introspection from the live catalog.

use godam_db::{CatalogSession, TableRef};
use tracing::info;

use crate::error::{Result, SchemaError};
use crate::table::{ColumnSchema, TableSchema};

/// Load the ordered column schema of `table`.
///
/// A table with no visible columns is treated as missing.
pub async fn load_table_schema<S>(session: &mut S, table: &TableRef) -> Result<TableSchema>
where
    S: CatalogSession + ?Sized,
{
    let columns = session.table_columns(table).await?;
    if columns.is_empty() {
        return Err(SchemaError::SchemaNotFound(table.to_string()));
    }

    let columns: Vec<ColumnSchema> = columns.into_iter().map(ColumnSchema::from_catalog).collect();
    info!(table = %table, columns = columns.len(), "Loaded table schema");
    Ok(TableSchema::new(table.clone(), columns))
}
