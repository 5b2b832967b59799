//! Run orchestration.
//!
//! Setup (schema, required columns, reference sets, stock snapshot) runs
//! first and aborts the run on any failure. Rows are then validated in input
//! order, rejections are reported, and accepted rows are written in one
//! transaction. The report is written before the database write so a failed
//! write never loses rejection details.

use godam_db::{CatalogSession, TableRef};
use godam_schema::{
    load_foreign_keys, load_table_schema, ColumnSchema, ExistingKeyMap, ForeignKeyRef,
    ReferenceSets, TableSchema, REQUIRED_COLUMNS,
};
use godam_sinks::{write_rejection_report, InputTable, ReportRow};
use godam_validator::{validate_batch, OutcomeCounts, RowValidator, ValidationOutcome};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use crate::config::RunConfig;
use crate::error::{IngestError, Result};
use crate::ingest::write_accepted;

/// What a completed run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub table: String,
    #[serde(flatten)]
    pub counts: OutcomeCounts,
    /// Rows affected by the upsert; zero in a dry run.
    pub written: u64,
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
}

/// Introspected table as shown by `godam schema`.
#[derive(Debug, Clone, Serialize)]
pub struct TableDescription {
    pub table: TableRef,
    pub columns: Vec<ColumnSchema>,
    pub foreign_keys: Vec<ForeignKeyRef>,
}

/// Load the target schema and fail unless every required column is present.
pub async fn load_target_schema<S>(session: &mut S, table: &TableRef) -> Result<TableSchema>
where
    S: CatalogSession + ?Sized,
{
    let schema = load_table_schema(session, table).await?;
    schema.require_columns(REQUIRED_COLUMNS)?;
    Ok(schema)
}

/// Reference sets for every FK column, or a disabled set when skipped.
pub async fn load_references<S>(
    session: &mut S,
    schema: &TableSchema,
    skip_fk_check: bool,
) -> Result<ReferenceSets>
where
    S: CatalogSession + ?Sized,
{
    if skip_fk_check {
        info!("Foreign key checks disabled");
        return Ok(ReferenceSets::disabled());
    }
    let foreign_keys = load_foreign_keys(session, &schema.table).await?;
    Ok(ReferenceSets::load(session, schema, &foreign_keys).await?)
}

/// Validate `input` against the live schema and upsert the accepted rows.
pub async fn run_validation<S>(
    mut session: S,
    config: &RunConfig,
    input: &InputTable,
) -> Result<RunSummary>
where
    S: CatalogSession,
{
    let schema = load_target_schema(&mut session, &config.table).await?;
    let references = load_references(&mut session, &schema, config.skip_fk_check).await?;
    let existing = ExistingKeyMap::load(&mut session, &config.stock_table).await?;

    let validator = RowValidator::new(&schema, &references)?;
    let outcome = validate_batch(&validator, &input.rows, &existing);

    let report_path = report_rejections(&schema, &outcome, config)?;

    let written = write_accepted(session, &schema, &outcome.accepted, config.dry_run)
        .await
        .map_err(|source| IngestError::Write {
            rows: outcome.accepted.len(),
            report_path: report_path.clone(),
            source,
        })?;

    Ok(RunSummary {
        table: schema.table.to_string(),
        counts: outcome.counts(),
        written,
        dry_run: config.dry_run,
        report_path,
    })
}

fn report_rejections(
    schema: &TableSchema,
    outcome: &ValidationOutcome,
    config: &RunConfig,
) -> Result<Option<PathBuf>> {
    if outcome.rejected.is_empty() {
        info!("No invalid rows found");
        return Ok(None);
    }

    let columns: Vec<String> = schema.columns.iter().map(|c| c.name.clone()).collect();
    let rows: Vec<ReportRow> = outcome
        .rejected
        .iter()
        .map(|row| ReportRow {
            values: row.values.clone(),
            reason: row.reason(),
        })
        .collect();

    write_rejection_report(&config.error_output, &columns, &rows).map_err(IngestError::Report)?;
    Ok(Some(config.error_output.clone()))
}

/// Column schema and foreign keys of `table`, without the required-column
/// check.
pub async fn describe_table<S>(session: &mut S, table: &TableRef) -> Result<TableDescription>
where
    S: CatalogSession + ?Sized,
{
    let schema = load_table_schema(session, table).await?;
    let foreign_keys = load_foreign_keys(session, table).await?;
    Ok(TableDescription {
        table: schema.table,
        columns: schema.columns,
        foreign_keys,
    })
}
