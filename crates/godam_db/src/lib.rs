//! Database layer for GoDam uploads.
//!
//! The upload pipeline talks to the database only through
//! [`CatalogSession`]: column metadata, foreign-key discovery, full-column
//! scans and one bulk upsert, all inside a single transaction.
//!
//! # Usage
//!
//! ```rust,ignore
//! use godam_db::{CatalogSession, PgCatalog, TableRef};
//!
//! let catalog = PgCatalog::connect("postgres://localhost/godam").await?;
//! let mut session = catalog.begin().await?;
//! let columns = session.table_columns(&TableRef::parse("stock")?).await?;
//! session.commit().await?;
//! ```

mod catalog;
mod error;
mod postgres;
mod table;
mod upsert;

pub use catalog::{CatalogColumn, CatalogForeignKey, CatalogSession};
pub use error::{DbError, Result};
pub use postgres::{PgCatalog, PgSession};
pub use table::{quote_ident, TableRef, DEFAULT_SCHEMA};
pub use upsert::{UpsertColumn, UpsertPlan, MAX_BIND_PARAMS};
