//! Setup errors raised while loading the target table definition.

use thiserror::Error;

/// Errors that abort a run before any row is read.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Table {0} not found")]
    SchemaNotFound(String),

    #[error("Required columns missing from {table}: {}", missing.join(", "))]
    MissingRequiredColumns { table: String, missing: Vec<String> },

    #[error("Invalid table name '{0}': expected [schema.]table")]
    InvalidTableName(String),

    #[error(transparent)]
    Db(#[from] godam_db::DbError),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
