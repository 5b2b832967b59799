//! Integration tests against a live PostgreSQL.
//!
//! Run with:
//!   docker run -d -p 15434:5432 -e POSTGRES_USER=godam -e POSTGRES_PASSWORD=godam \
//!       -e POSTGRES_DB=godam_test postgres:16
//!   cargo test -p godam_test_utils --features docker-tests

#![cfg(feature = "docker-tests")]

use godam_db::{CatalogSession, PgCatalog, TableRef, UpsertColumn, UpsertPlan};
use godam_test_utils::{PostgresTestGuard, TestPgPool};
use sqlx::Row;

async fn stock_fixture() -> (TestPgPool, PostgresTestGuard, TableRef) {
    let pool = TestPgPool::connect().await.unwrap();
    let guard = PostgresTestGuard::new(pool.pool.clone()).await.unwrap();
    guard
        .execute(
            "CREATE TABLE stock (
                part_number TEXT NOT NULL,
                warehouse_no TEXT NOT NULL,
                qty INTEGER,
                received DATE,
                PRIMARY KEY (part_number, warehouse_no)
            )",
        )
        .await
        .unwrap();
    guard
        .execute("INSERT INTO stock VALUES ('P1', 'W1', 3, NULL)")
        .await
        .unwrap();
    let table = TableRef::new(guard.schema_name(), "stock");
    (pool, guard, table)
}

fn plan(table: &TableRef, rows: Vec<Vec<Option<String>>>) -> UpsertPlan {
    UpsertPlan::new(
        table.clone(),
        vec![
            UpsertColumn::new("part_number", "pg_catalog", "text"),
            UpsertColumn::new("warehouse_no", "pg_catalog", "text"),
            UpsertColumn::new("qty", "pg_catalog", "int4"),
            UpsertColumn::new("received", "pg_catalog", "date"),
        ],
        vec!["part_number".to_string(), "warehouse_no".to_string()],
        rows,
    )
}

fn row(values: [Option<&str>; 4]) -> Vec<Option<String>> {
    values.iter().map(|v| v.map(str::to_string)).collect()
}

#[tokio::test]
async fn introspects_columns_in_ordinal_order() {
    let (pool, _guard, table) = stock_fixture().await;
    let catalog = PgCatalog::from_pool(pool.pool.clone());
    let mut session = catalog.begin().await.unwrap();

    let columns = session.table_columns(&table).await.unwrap();
    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["part_number", "warehouse_no", "qty", "received"]);
    assert_eq!(columns[2].udt_name, "int4");
    assert!(!columns[0].nullable);
}

#[tokio::test]
async fn upsert_casts_text_parameters_and_updates_on_conflict() {
    let (pool, guard, table) = stock_fixture().await;
    let catalog = PgCatalog::from_pool(pool.pool.clone());
    let mut session = catalog.begin().await.unwrap();

    let affected = session
        .upsert_rows(&plan(
            &table,
            vec![
                row([Some("P1"), Some("W1"), Some("10"), Some("2024-03-01")]),
                row([Some("P2"), Some("W1"), None, None]),
            ],
        ))
        .await
        .unwrap();
    assert_eq!(affected, 2);
    session.commit().await.unwrap();

    let rows = guard
        .fetch_all("SELECT part_number, qty FROM stock ORDER BY part_number")
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get::<Option<i32>, _>("qty"), Some(10));
    assert_eq!(rows[1].get::<Option<i32>, _>("qty"), None);
}

#[tokio::test]
async fn uncommitted_session_leaves_table_untouched() {
    let (pool, guard, table) = stock_fixture().await;
    let catalog = PgCatalog::from_pool(pool.pool.clone());
    {
        let mut session = catalog.begin().await.unwrap();
        session
            .upsert_rows(&plan(&table, vec![row([Some("P9"), Some("W9"), Some("1"), None])]))
            .await
            .unwrap();
    }

    let rows = guard.fetch_all("SELECT 1 FROM stock").await.unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test]
async fn discovers_foreign_keys() {
    let (pool, guard, table) = stock_fixture().await;
    guard
        .execute("CREATE TABLE vendors (name TEXT PRIMARY KEY)")
        .await
        .unwrap();
    guard
        .execute("ALTER TABLE stock ADD COLUMN vendor_name TEXT REFERENCES vendors(name)")
        .await
        .unwrap();

    let catalog = PgCatalog::from_pool(pool.pool.clone());
    let mut session = catalog.begin().await.unwrap();
    let fks = session.foreign_keys(&table).await.unwrap();
    assert_eq!(fks.len(), 1);
    assert_eq!(fks[0].column, "vendor_name");
    assert_eq!(fks[0].target.name, "vendors");
    assert_eq!(fks[0].target_column, "name");
}
