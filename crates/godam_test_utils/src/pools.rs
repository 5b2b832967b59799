//! PostgreSQL test pool factory.

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

use crate::config::TestDbConfig;

/// A PostgreSQL connection pool for testing.
#[derive(Debug, Clone)]
pub struct TestPgPool {
    /// The underlying sqlx pool
    pub pool: PgPool,
}

impl TestPgPool {
    /// Connect using [`TestDbConfig::from_env`].
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use godam_test_utils::TestPgPool;
    ///
    /// #[tokio::test]
    /// async fn test_postgres() {
    ///     let pool = TestPgPool::connect().await.unwrap();
    ///     pool.execute("SELECT 1").await.unwrap();
    /// }
    /// ```
    pub async fn connect() -> Result<Self> {
        Self::with_config(&TestDbConfig::from_env()).await
    }

    pub async fn with_config(config: &TestDbConfig) -> Result<Self> {
        info!("Creating PostgreSQL test pool");

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.url)
            .await
            .context("connecting to test database")?;

        Ok(Self { pool })
    }

    /// Execute a query that doesn't return rows.
    pub async fn execute(&self, query: &str) -> Result<()> {
        sqlx::query(query).execute(&self.pool).await?;
        Ok(())
    }

    pub fn inner(&self) -> &PgPool {
        &self.pool
    }
}
