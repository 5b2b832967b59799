//! GoDam stock upload pipeline.
//!
//! Validates a spreadsheet or CSV upload against the live schema of a
//! Postgres table, reports rejected rows, and upserts the accepted ones in a
//! single transaction. The database is reached only through
//! [`godam_db::CatalogSession`], so the whole pipeline runs against an
//! in-memory catalog in tests.

pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;

pub use config::{RunConfig, DEFAULT_ERROR_OUTPUT, DEFAULT_STOCK_TABLE};
pub use error::{IngestError, Result};
pub use ingest::{build_upsert_plan, write_accepted};
pub use pipeline::{
    describe_table, load_references, load_target_schema, run_validation, RunSummary,
    TableDescription,
};
