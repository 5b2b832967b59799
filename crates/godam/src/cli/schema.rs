//! `godam schema`: show the introspected target table.

use anyhow::Result;
use clap::Args;
use godam::{describe_table, TableDescription};
use godam_db::PgCatalog;
use godam_schema::parse_table_name;

use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};

/// Arguments for the `schema` command
#[derive(Debug, Args)]
pub struct SchemaArgs {
    /// Table, optionally schema-qualified
    #[arg(long)]
    pub table: String,

    /// PostgreSQL connection URL
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub db_url: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SchemaArgs) -> Result<()> {
    let table =
        parse_table_name(&args.table).map_err(|_| HelpfulError::invalid_table_name(&args.table))?;
    let db_url = args
        .db_url
        .clone()
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(HelpfulError::missing_database_url)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let description = rt.block_on(async {
        let catalog = PgCatalog::connect(&db_url)
            .await
            .map_err(|e| HelpfulError::connection_failed(&e.to_string()))?;
        let mut session = catalog
            .begin()
            .await
            .map_err(|e| HelpfulError::connection_failed(&e.to_string()))?;
        let result = describe_table(&mut session, &table).await;
        drop(session);
        catalog.close().await;
        result.map_err(HelpfulError::from_ingest)
    })?;

    if args.json {
        return print_json(&description);
    }
    print_table(
        &["Column", "Type", "Logical", "Nullable", "Max length", "References"],
        column_rows(&description),
    );
    Ok(())
}

fn column_rows(description: &TableDescription) -> Vec<Vec<String>> {
    description
        .columns
        .iter()
        .map(|column| {
            let reference = description
                .foreign_keys
                .iter()
                .find(|fk| fk.column == column.name)
                .map(|fk| format!("{}.{}", fk.target, fk.target_column))
                .unwrap_or_default();
            vec![
                column.name.clone(),
                column.declared_type.clone(),
                column.logical_type.to_string(),
                if column.nullable { "yes" } else { "no" }.to_string(),
                column
                    .max_length
                    .map(|len| len.to_string())
                    .unwrap_or_default(),
                reference,
            ]
        })
        .collect()
}
