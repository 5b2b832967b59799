//! `godam validate`: check an upload and ingest the accepted rows.

use anyhow::Result;
use clap::Args;
use godam::{run_validation, RunConfig, RunSummary, DEFAULT_ERROR_OUTPUT, DEFAULT_STOCK_TABLE};
use godam_db::PgCatalog;
use godam_schema::parse_table_name;
use godam_sinks::{read_input_table, report_format};
use std::path::PathBuf;

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};

/// Arguments for the `validate` command
#[derive(Debug, Args)]
pub struct ValidateArgs {
    /// Upload file (.xlsx, .xls or .csv)
    pub input: PathBuf,

    /// Target table, optionally schema-qualified (e.g. inventory.stock)
    #[arg(long)]
    pub table: String,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub db_url: Option<String>,

    /// Where to write rejected rows (.xlsx or .csv)
    #[arg(long, default_value = DEFAULT_ERROR_OUTPUT)]
    pub error_output: PathBuf,

    /// Validate and report only, never write
    #[arg(long)]
    pub dry_run: bool,

    /// Skip foreign-key membership checks
    #[arg(long)]
    pub skip_fk_check: bool,

    /// Table holding existing stock, used for update notices
    #[arg(long, default_value = DEFAULT_STOCK_TABLE)]
    pub stock_table: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl ValidateArgs {
    pub fn to_config(&self) -> Result<RunConfig, HelpfulError> {
        let table = parse_table_name(&self.table)
            .map_err(|_| HelpfulError::invalid_table_name(&self.table))?;
        let stock_table = parse_table_name(&self.stock_table)
            .map_err(|_| HelpfulError::invalid_table_name(&self.stock_table))?;
        report_format(&self.error_output)
            .map_err(|_| HelpfulError::unsupported_report_type(&self.error_output))?;
        Ok(RunConfig::new(&self.input, table)
            .with_stock_table(stock_table)
            .with_error_output(&self.error_output)
            .dry_run(self.dry_run)
            .skip_fk_check(self.skip_fk_check))
    }
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let config = args.to_config()?;
    let db_url = args
        .db_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(HelpfulError::missing_database_url)?;

    let input = read_input_table(&config.input)
        .map_err(|e| HelpfulError::from_input(&config.input, e))?;
    if input.is_empty() {
        if args.json {
            print_json(&serde_json::json!({ "input_rows": 0, "message": "No rows found in input." }))?;
        } else {
            println!("No rows found in input.");
        }
        return Ok(());
    }

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let summary = rt.block_on(async {
        let catalog = PgCatalog::connect(&db_url)
            .await
            .map_err(|e| HelpfulError::connection_failed(&e.to_string()))?;
        let session = catalog
            .begin()
            .await
            .map_err(|e| HelpfulError::connection_failed(&e.to_string()))?;
        let result = run_validation(session, &config, &input).await;
        catalog.close().await;
        result.map_err(HelpfulError::from_ingest)
    })?;

    if args.json {
        print_json(&summary)
    } else {
        print_summary(&summary);
        Ok(())
    }
}

fn summary_rows(summary: &RunSummary) -> Vec<Vec<String>> {
    let counts = &summary.counts;
    let mut rows = vec![
        vec!["Table".to_string(), summary.table.clone()],
        vec!["Input rows".to_string(), counts.input_rows.to_string()],
        vec!["Accepted".to_string(), counts.accepted.to_string()],
        vec!["Rejected".to_string(), counts.rejected.to_string()],
        vec!["Updated".to_string(), counts.updated.to_string()],
        vec!["Inserted".to_string(), counts.inserted.to_string()],
        vec![
            "Written".to_string(),
            if summary.dry_run {
                "0 (dry run)".to_string()
            } else {
                summary.written.to_string()
            },
        ],
    ];
    if let Some(path) = &summary.report_path {
        rows.push(vec!["Error report".to_string(), path.display().to_string()]);
    }
    rows
}

fn print_summary(summary: &RunSummary) {
    print_table(&["Metric", "Value"], summary_rows(summary));
    if summary.report_path.is_none() {
        println!("No invalid rows found.");
    }
}
