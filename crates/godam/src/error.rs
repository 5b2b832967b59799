use godam_db::DbError;
use godam_schema::SchemaError;
use godam_sinks::SinkError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that terminate a run. Row-level problems never surface here.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Failed to write rejection report: {0}")]
    Report(#[source] SinkError),

    /// The bulk upsert or its commit failed; nothing was persisted.
    #[error("Failed to write {rows} accepted rows: {source}")]
    Write {
        rows: usize,
        report_path: Option<PathBuf>,
        #[source]
        source: DbError,
    },
}

pub type Result<T> = std::result::Result<T, IngestError>;
