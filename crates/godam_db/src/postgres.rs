//! PostgreSQL implementation of [`CatalogSession`].

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, Row, Transaction};
use std::time::{Duration, Instant};
use tracing::{debug, debug_span, info, Instrument};

use crate::catalog::{CatalogColumn, CatalogForeignKey, CatalogSession};
use crate::error::{DbError, Result};
use crate::table::{quote_ident, TableRef};
use crate::upsert::UpsertPlan;

const COLUMNS_SQL: &str = r#"
SELECT
  column_name::text AS column_name,
  is_nullable::text AS is_nullable,
  data_type::text AS data_type,
  udt_schema::text AS udt_schema,
  udt_name::text AS udt_name,
  character_maximum_length::int4 AS max_length,
  numeric_precision::int4 AS numeric_precision
FROM information_schema.columns
WHERE table_schema = $1 AND table_name = $2
ORDER BY ordinal_position
"#;

const FOREIGN_KEYS_SQL: &str = r#"
SELECT
  kcu.column_name::text AS column_name,
  ccu.table_schema::text AS target_schema,
  ccu.table_name::text AS target_table,
  ccu.column_name::text AS target_column
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON tc.constraint_name = kcu.constraint_name AND tc.table_schema = kcu.table_schema
JOIN information_schema.constraint_column_usage ccu
  ON tc.constraint_name = ccu.constraint_name AND tc.table_schema = ccu.constraint_schema
WHERE tc.constraint_type = 'FOREIGN KEY'
  AND tc.table_schema = $1
  AND tc.table_name = $2
ORDER BY tc.constraint_name, kcu.ordinal_position
"#;

/// Connection factory for the upload database.
///
/// The pool holds a single connection: one run is one session.
#[derive(Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    /// Connect to a `postgres://` URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(10))
            .connect(url)
            .await?;

        info!("Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Wrap an existing pool (tests share one across guards).
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open the run's session. The transaction starts here.
    pub async fn begin(&self) -> Result<PgSession> {
        let tx = self.pool.begin().await?;
        Ok(PgSession { tx })
    }

    /// Close the pool.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// A transaction-scoped session. Dropping it without commit rolls back.
pub struct PgSession {
    tx: Transaction<'static, Postgres>,
}

impl std::fmt::Debug for PgSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgSession")
            .field("backend", &"PostgreSQL")
            .finish()
    }
}

#[async_trait]
impl CatalogSession for PgSession {
    async fn table_columns(&mut self, table: &TableRef) -> Result<Vec<CatalogColumn>> {
        let started = Instant::now();
        let rows = sqlx::query(COLUMNS_SQL)
            .bind(&table.schema)
            .bind(&table.name)
            .fetch_all(&mut *self.tx)
            .instrument(query_span("SELECT", COLUMNS_SQL))
            .await?;
        debug!(
            table = %table,
            columns = rows.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Loaded column metadata"
        );

        rows.iter().map(column_from_row).collect()
    }

    async fn foreign_keys(&mut self, table: &TableRef) -> Result<Vec<CatalogForeignKey>> {
        let rows = sqlx::query(FOREIGN_KEYS_SQL)
            .bind(&table.schema)
            .bind(&table.name)
            .fetch_all(&mut *self.tx)
            .instrument(query_span("SELECT", FOREIGN_KEYS_SQL))
            .await?;

        rows.iter()
            .map(|row| {
                Ok(CatalogForeignKey {
                    column: row.try_get("column_name")?,
                    target: TableRef::new(
                        row.try_get::<String, _>("target_schema")?,
                        row.try_get::<String, _>("target_table")?,
                    ),
                    target_column: row.try_get("target_column")?,
                })
            })
            .collect()
    }

    async fn scan_columns(
        &mut self,
        table: &TableRef,
        columns: &[&str],
    ) -> Result<Vec<Vec<Option<String>>>> {
        if columns.is_empty() {
            return Err(DbError::invalid_input("scan requires at least one column"));
        }

        let select_list = columns
            .iter()
            .map(|col| format!("{}::text", quote_ident(col)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("SELECT {} FROM {}", select_list, table.quoted());

        let started = Instant::now();
        let rows = sqlx::query(&sql)
            .fetch_all(&mut *self.tx)
            .instrument(query_span("SELECT", &sql))
            .await?;
        debug!(
            table = %table,
            rows = rows.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Scanned table"
        );

        rows.iter()
            .map(|row| {
                (0..columns.len())
                    .map(|idx| row.try_get::<Option<String>, _>(idx).map_err(DbError::from))
                    .collect::<Result<Vec<_>>>()
            })
            .collect()
    }

    async fn upsert_rows(&mut self, plan: &UpsertPlan) -> Result<u64> {
        plan.validate()?;
        if plan.is_empty() {
            return Ok(0);
        }

        let mut affected = 0;
        for chunk in plan.rows.chunks(plan.rows_per_statement()) {
            let sql = plan.statement_sql(chunk.len());
            let mut query = sqlx::query(&sql);
            for row in chunk {
                for value in row {
                    query = query.bind(value.as_deref());
                }
            }
            let result = query
                .execute(&mut *self.tx)
                .instrument(query_span("INSERT", &sql))
                .await?;
            affected += result.rows_affected();
        }

        Ok(affected)
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::transaction(format!("commit failed: {}", e)))
    }
}

fn column_from_row(row: &PgRow) -> Result<CatalogColumn> {
    let is_nullable: String = row.try_get("is_nullable")?;
    Ok(CatalogColumn {
        name: row.try_get("column_name")?,
        nullable: is_nullable == "YES",
        data_type: row.try_get("data_type")?,
        udt_schema: row.try_get("udt_schema")?,
        udt_name: row.try_get("udt_name")?,
        max_length: row.try_get("max_length")?,
        precision: row.try_get("numeric_precision")?,
    })
}

fn query_span(op: &str, sql: &str) -> tracing::Span {
    debug_span!("db.query", op = op, sql_hash = %hash_sql(sql))
}

fn hash_sql(sql: &str) -> String {
    // FNV-1a 64-bit hash for low-cardinality, stable identification.
    let mut hash: u64 = 0xcbf29ce484222325;
    for byte in sql.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    format!("{:016x}", hash)
}
