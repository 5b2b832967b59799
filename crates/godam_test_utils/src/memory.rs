//! In-memory catalog standing in for a Postgres database.

use async_trait::async_trait;
use godam_db::{
    CatalogColumn, CatalogForeignKey, CatalogSession, DbError, Result, TableRef, UpsertPlan,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

type Row = Vec<Option<String>>;

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<CatalogColumn>,
    foreign_keys: Vec<CatalogForeignKey>,
    rows: Vec<Row>,
}

impl MemoryTable {
    fn position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    fn apply(&mut self, plan: &UpsertPlan) -> Result<u64> {
        let positions = plan
            .columns
            .iter()
            .map(|c| {
                self.position(&c.name).ok_or_else(|| {
                    DbError::invalid_input(format!("column {} does not exist", c.name))
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let conflict = plan
            .conflict_columns
            .iter()
            .map(|name| {
                self.position(name).ok_or_else(|| {
                    DbError::invalid_input(format!("conflict column {} does not exist", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        for values in &plan.rows {
            let mut incoming: Row = vec![None; self.columns.len()];
            for (pos, value) in positions.iter().zip(values) {
                incoming[*pos] = value.clone();
            }

            let existing = self
                .rows
                .iter_mut()
                .find(|row| conflict.iter().all(|&idx| row[idx] == incoming[idx]));
            match existing {
                Some(row) => {
                    for &pos in &positions {
                        row[pos] = incoming[pos].clone();
                    }
                }
                None => self.rows.push(incoming),
            }
        }
        Ok(plan.rows.len() as u64)
    }
}

#[derive(Debug, Default)]
struct CatalogState {
    tables: HashMap<TableRef, MemoryTable>,
    upserts: Vec<UpsertPlan>,
    commits: usize,
    upsert_failure: Option<String>,
}

/// Shared handle to an in-memory catalog.
///
/// Cloning the handle shares state, so a test can keep one copy for
/// assertions while the pipeline consumes a session.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    state: Arc<Mutex<CatalogState>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_table(&self, table: &TableRef, columns: Vec<CatalogColumn>) {
        self.lock().tables.insert(
            table.clone(),
            MemoryTable {
                columns,
                ..MemoryTable::default()
            },
        );
    }

    /// Declare `table.column` as referencing `target.target_column`.
    pub fn add_foreign_key(
        &self,
        table: &TableRef,
        column: &str,
        target: &TableRef,
        target_column: &str,
    ) {
        if let Some(t) = self.lock().tables.get_mut(table) {
            t.foreign_keys.push(CatalogForeignKey {
                column: column.to_string(),
                target: target.clone(),
                target_column: target_column.to_string(),
            });
        }
    }

    /// Append a row given as `(column, text)` pairs; unnamed columns are NULL.
    pub fn insert_row(&self, table: &TableRef, values: &[(&str, Option<&str>)]) {
        let mut state = self.lock();
        if let Some(t) = state.tables.get_mut(table) {
            let mut row: Row = vec![None; t.columns.len()];
            for (name, value) in values {
                if let Some(idx) = t.position(name) {
                    row[idx] = value.map(str::to_string);
                }
            }
            t.rows.push(row);
        }
    }

    /// Committed rows of `table`, in column order.
    pub fn rows(&self, table: &TableRef) -> Vec<Row> {
        self.lock()
            .tables
            .get(table)
            .map(|t| t.rows.clone())
            .unwrap_or_default()
    }

    /// Committed value of `column` for every row of `table`.
    pub fn column_values(&self, table: &TableRef, column: &str) -> Vec<Option<String>> {
        let state = self.lock();
        let Some(t) = state.tables.get(table) else {
            return Vec::new();
        };
        let Some(idx) = t.position(column) else {
            return Vec::new();
        };
        t.rows.iter().map(|row| row[idx].clone()).collect()
    }

    /// Every upsert plan submitted by any session, committed or not.
    pub fn upserts(&self) -> Vec<UpsertPlan> {
        self.lock().upserts.clone()
    }

    pub fn commit_count(&self) -> usize {
        self.lock().commits
    }

    /// Make every following upsert fail with `message`.
    pub fn fail_upserts_with(&self, message: &str) {
        self.lock().upsert_failure = Some(message.to_string());
    }

    pub fn begin(&self) -> MemorySession {
        MemorySession {
            catalog: self.clone(),
            staged: Vec::new(),
        }
    }
}

/// One session against a [`MemoryCatalog`]. Upserts are staged and applied on
/// commit; dropping the session discards them.
#[derive(Debug)]
pub struct MemorySession {
    catalog: MemoryCatalog,
    staged: Vec<UpsertPlan>,
}

#[async_trait]
impl CatalogSession for MemorySession {
    async fn table_columns(&mut self, table: &TableRef) -> Result<Vec<CatalogColumn>> {
        Ok(self
            .catalog
            .lock()
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn foreign_keys(&mut self, table: &TableRef) -> Result<Vec<CatalogForeignKey>> {
        Ok(self
            .catalog
            .lock()
            .tables
            .get(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }

    async fn scan_columns(
        &mut self,
        table: &TableRef,
        columns: &[&str],
    ) -> Result<Vec<Vec<Option<String>>>> {
        let state = self.catalog.lock();
        let t = state
            .tables
            .get(table)
            .ok_or_else(|| DbError::invalid_input(format!("relation {} does not exist", table)))?;
        let positions = columns
            .iter()
            .map(|name| {
                t.position(name).ok_or_else(|| {
                    DbError::invalid_input(format!("column {} does not exist", name))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(t.rows
            .iter()
            .map(|row| positions.iter().map(|&idx| row[idx].clone()).collect())
            .collect())
    }

    async fn upsert_rows(&mut self, plan: &UpsertPlan) -> Result<u64> {
        plan.validate()?;
        let mut state = self.catalog.lock();
        state.upserts.push(plan.clone());
        if let Some(message) = &state.upsert_failure {
            return Err(DbError::transaction(message.clone()));
        }
        if !state.tables.contains_key(&plan.table) {
            return Err(DbError::invalid_input(format!(
                "relation {} does not exist",
                plan.table
            )));
        }
        self.staged.push(plan.clone());
        Ok(plan.rows.len() as u64)
    }

    async fn commit(self) -> Result<()> {
        let mut state = self.catalog.lock();
        for plan in &self.staged {
            let table = state.tables.get_mut(&plan.table).ok_or_else(|| {
                DbError::invalid_input(format!("relation {} does not exist", plan.table))
            })?;
            table.apply(plan)?;
        }
        state.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use godam_db::UpsertColumn;

    fn stock() -> TableRef {
        TableRef::new("public", "stock")
    }

    fn catalog() -> MemoryCatalog {
        let catalog = MemoryCatalog::new();
        catalog.add_table(
            &stock(),
            vec![
                CatalogColumn::builtin("part_number", "text", "text", false),
                CatalogColumn::builtin("warehouse_no", "text", "text", false),
                CatalogColumn::builtin("qty", "integer", "int4", true),
            ],
        );
        catalog.insert_row(
            &stock(),
            &[("part_number", Some("P1")), ("warehouse_no", Some("W1")), ("qty", Some("3"))],
        );
        catalog
    }

    fn plan(rows: Vec<Row>) -> UpsertPlan {
        UpsertPlan::new(
            stock(),
            vec![
                UpsertColumn::new("part_number", "pg_catalog", "text"),
                UpsertColumn::new("warehouse_no", "pg_catalog", "text"),
                UpsertColumn::new("qty", "pg_catalog", "int4"),
            ],
            vec!["part_number".to_string(), "warehouse_no".to_string()],
            rows,
        )
    }

    fn text_row(values: &[&str]) -> Row {
        values.iter().map(|v| Some(v.to_string())).collect()
    }

    #[tokio::test]
    async fn upsert_is_invisible_until_commit() {
        let catalog = catalog();
        let mut session = catalog.begin();
        session
            .upsert_rows(&plan(vec![text_row(&["P2", "W1", "5"])]))
            .await
            .unwrap();
        assert_eq!(catalog.rows(&stock()).len(), 1);

        session.commit().await.unwrap();
        assert_eq!(catalog.rows(&stock()).len(), 2);
        assert_eq!(catalog.commit_count(), 1);
    }

    #[tokio::test]
    async fn dropped_session_rolls_back() {
        let catalog = catalog();
        {
            let mut session = catalog.begin();
            session
                .upsert_rows(&plan(vec![text_row(&["P2", "W1", "5"])]))
                .await
                .unwrap();
        }
        assert_eq!(catalog.rows(&stock()).len(), 1);
        assert_eq!(catalog.upserts().len(), 1);
    }

    #[tokio::test]
    async fn conflicting_key_updates_in_place() {
        let catalog = catalog();
        let mut session = catalog.begin();
        session
            .upsert_rows(&plan(vec![text_row(&["P1", "W1", "9"])]))
            .await
            .unwrap();
        session.commit().await.unwrap();

        assert_eq!(
            catalog.column_values(&stock(), "qty"),
            vec![Some("9".to_string())]
        );
    }

    #[tokio::test]
    async fn scan_returns_requested_columns_in_order() {
        let catalog = catalog();
        let mut session = catalog.begin();
        let rows = session
            .scan_columns(&stock(), &["qty", "part_number"])
            .await
            .unwrap();
        assert_eq!(rows, vec![vec![Some("3".to_string()), Some("P1".to_string())]]);

        assert!(session.scan_columns(&stock(), &["nope"]).await.is_err());
    }

    #[tokio::test]
    async fn injected_failure_is_reported() {
        let catalog = catalog();
        catalog.fail_upserts_with("disk full");
        let mut session = catalog.begin();
        let err = session
            .upsert_rows(&plan(vec![text_row(&["P2", "W1", "5"])]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("disk full"));
    }
}
