//! Test cleanup utilities for database isolation.

use anyhow::Result;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

/// RAII guard for PostgreSQL test isolation.
///
/// Creates a unique schema for each test and drops it on Drop. Tables are
/// addressed schema-qualified, e.g. `format!("{}.stock", guard.schema_name())`.
pub struct PostgresTestGuard {
    pool: PgPool,
    schema_name: String,
}

impl PostgresTestGuard {
    /// Create a new test guard with a unique schema.
    pub async fn new(pool: PgPool) -> Result<Self> {
        let schema_name = format!("godam_test_{}", Uuid::new_v4().simple());

        debug!("Creating test schema: {}", schema_name);
        sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
            .execute(&pool)
            .await?;

        Ok(Self { pool, schema_name })
    }

    /// Execute a statement with the guard's schema first on the search path.
    pub async fn execute(&self, query: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("SET LOCAL search_path TO {}", self.schema_name))
            .execute(&mut *tx)
            .await?;
        sqlx::query(query).execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Execute a query and return all rows.
    pub async fn fetch_all(&self, query: &str) -> Result<Vec<sqlx::postgres::PgRow>> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(&format!("SET LOCAL search_path TO {}", self.schema_name))
            .execute(&mut *tx)
            .await?;
        let rows = sqlx::query(query).fetch_all(&mut *tx).await?;
        tx.commit().await?;
        Ok(rows)
    }

    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for PostgresTestGuard {
    fn drop(&mut self) {
        let pool = self.pool.clone();
        let schema_name = self.schema_name.clone();

        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn(async move {
                if let Err(e) = sqlx::query(&format!("DROP SCHEMA {} CASCADE", schema_name))
                    .execute(&pool)
                    .await
                {
                    warn!("Failed to drop test schema {}: {}", schema_name, e);
                } else {
                    debug!("Dropped test schema: {}", schema_name);
                }
            });
        } else {
            warn!(
                "Not in async context, cannot cleanup schema: {}",
                self.schema_name
            );
        }
    }
}
