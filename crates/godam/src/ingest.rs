//! Ingestion writer: one upsert of every accepted row, then one commit.

use godam_db::{CatalogSession, DbError, UpsertPlan};
use godam_schema::TableSchema;
use godam_validator::AcceptedRow;
use tracing::info;

/// Build the upsert for `rows`: full column list in schema order, conflict on
/// the business key.
pub fn build_upsert_plan(schema: &TableSchema, rows: &[AcceptedRow]) -> Result<UpsertPlan, DbError> {
    let keys = schema
        .key_columns()
        .map_err(|e| DbError::invalid_input(e.to_string()))?;
    let conflict_columns = vec![
        schema.columns[keys.part_number].name.clone(),
        schema.columns[keys.warehouse_no].name.clone(),
    ];
    Ok(UpsertPlan::new(
        schema.table.clone(),
        schema.upsert_columns(),
        conflict_columns,
        rows.iter().map(AcceptedRow::sql_values).collect(),
    ))
}

/// Persist `rows` and commit the session.
///
/// Dry runs and empty batches return without writing; the session is dropped
/// uncommitted. Returns rows affected.
pub async fn write_accepted<S>(
    mut session: S,
    schema: &TableSchema,
    rows: &[AcceptedRow],
    dry_run: bool,
) -> Result<u64, DbError>
where
    S: CatalogSession,
{
    if dry_run {
        info!(rows = rows.len(), "Dry run: skipping database write");
        return Ok(0);
    }
    if rows.is_empty() {
        info!("No valid rows to write");
        return Ok(0);
    }

    let plan = build_upsert_plan(schema, rows)?;
    let written = session.upsert_rows(&plan).await?;
    session.commit().await?;
    info!(table = %schema.table, rows = written, "Committed upsert");
    Ok(written)
}
