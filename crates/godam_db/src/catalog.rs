//! The database capability consumed by the upload pipeline.
//!
//! Everything the validator and writer need from the database goes through
//! [`CatalogSession`], so tests can substitute an in-memory implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::table::TableRef;
use crate::upsert::UpsertPlan;

/// One column as reported by `information_schema.columns`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogColumn {
    pub name: String,
    pub nullable: bool,
    /// Declared type as the catalog spells it (e.g. `integer`, `character varying`).
    pub data_type: String,
    /// Schema of the underlying type (`pg_catalog` for built-ins).
    pub udt_schema: String,
    /// Underlying type name (e.g. `int4`, `varchar`), used for parameter casts.
    pub udt_name: String,
    pub max_length: Option<i32>,
    pub precision: Option<i32>,
}

impl CatalogColumn {
    /// Built-in column helper, mostly for fixtures.
    pub fn builtin(name: &str, data_type: &str, udt_name: &str, nullable: bool) -> Self {
        Self {
            name: name.to_string(),
            nullable,
            data_type: data_type.to_string(),
            udt_schema: "pg_catalog".to_string(),
            udt_name: udt_name.to_string(),
            max_length: None,
            precision: None,
        }
    }

    pub fn with_max_length(mut self, max_length: i32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn with_precision(mut self, precision: i32) -> Self {
        self.precision = Some(precision);
        self
    }
}

/// One foreign-key column mapping from constraint metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogForeignKey {
    pub column: String,
    pub target: TableRef,
    pub target_column: String,
}

/// A single database session held open for the whole run.
///
/// Implementations run every call inside one transaction. Nothing becomes
/// visible to other sessions until [`CatalogSession::commit`] succeeds;
/// dropping the session without committing rolls back.
#[async_trait]
pub trait CatalogSession: Send {
    /// Columns of `table` ordered by ordinal position. Empty if the table is
    /// missing or not visible.
    async fn table_columns(&mut self, table: &TableRef) -> Result<Vec<CatalogColumn>>;

    /// Foreign-key column mappings declared on `table`.
    async fn foreign_keys(&mut self, table: &TableRef) -> Result<Vec<CatalogForeignKey>>;

    /// Full scan of `columns` from `table`, every value rendered as text.
    async fn scan_columns(
        &mut self,
        table: &TableRef,
        columns: &[&str],
    ) -> Result<Vec<Vec<Option<String>>>>;

    /// Execute the upsert described by `plan`. Returns affected row count.
    async fn upsert_rows(&mut self, plan: &UpsertPlan) -> Result<u64>;

    /// Commit the session transaction.
    async fn commit(self) -> Result<()>
    where
        Self: Sized;
}
