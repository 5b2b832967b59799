//! GoDam Test Utilities
//!
//! Two kinds of catalog for tests:
//!
//! - [`MemoryCatalog`]: an in-process stand-in for a Postgres catalog. Tables,
//!   foreign keys and rows are declared up front; upserts are staged per
//!   session and only become visible after `commit`.
//! - [`TestPgPool`] / [`PostgresTestGuard`]: a real Postgres reached through
//!   `GODAM_TEST_DATABASE_URL`, each test isolated in its own schema.
//!
//! # Features
//!
//! - `docker-tests`: Enable tests that require a running PostgreSQL container
//!
//! # Usage
//!
//! ```rust,ignore
//! use godam_test_utils::MemoryCatalog;
//!
//! let catalog = MemoryCatalog::new();
//! catalog.add_table(&stock, columns);
//! let mut session = catalog.begin();
//! // drive the pipeline with `session`
//! ```

pub mod cleanup;
pub mod config;
pub mod memory;
pub mod pools;

pub use cleanup::PostgresTestGuard;
pub use config::TestDbConfig;
pub use memory::{MemoryCatalog, MemorySession};
pub use pools::TestPgPool;
