//! Bulk upsert planning.
//!
//! Values are carried as text and every placeholder is cast to the target
//! column's catalog type, so the server performs the final conversion.

use serde::Serialize;

use crate::error::{DbError, Result};
use crate::table::{quote_ident, TableRef};

/// Postgres limit on bind parameters per statement.
pub const MAX_BIND_PARAMS: usize = 65_535;

/// Target column of an upsert along with its cast type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpsertColumn {
    pub name: String,
    pub udt_schema: String,
    pub udt_name: String,
}

impl UpsertColumn {
    pub fn new(
        name: impl Into<String>,
        udt_schema: impl Into<String>,
        udt_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            udt_schema: udt_schema.into(),
            udt_name: udt_name.into(),
        }
    }

    fn cast_type(&self) -> String {
        format!(
            "{}.{}",
            quote_ident(&self.udt_schema),
            quote_ident(&self.udt_name)
        )
    }
}

/// Insert-or-update of many rows keyed on a unique constraint.
///
/// On conflict every column is overwritten with the incoming value.
#[derive(Debug, Clone, Serialize)]
pub struct UpsertPlan {
    pub table: TableRef,
    pub columns: Vec<UpsertColumn>,
    pub conflict_columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl UpsertPlan {
    pub fn new(
        table: TableRef,
        columns: Vec<UpsertColumn>,
        conflict_columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    ) -> Self {
        Self {
            table,
            columns,
            conflict_columns,
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Check the plan is well formed before any SQL is issued.
    pub fn validate(&self) -> Result<()> {
        if self.columns.is_empty() {
            return Err(DbError::invalid_input(
                "upsert requires at least one column",
            ));
        }
        if self.conflict_columns.is_empty() {
            return Err(DbError::invalid_input(
                "upsert requires at least one conflict column",
            ));
        }
        for conflict in &self.conflict_columns {
            if !self.columns.iter().any(|c| &c.name == conflict) {
                return Err(DbError::invalid_input(format!(
                    "conflict column '{}' is not part of the insert column list",
                    conflict
                )));
            }
        }
        if self.columns.len() > MAX_BIND_PARAMS {
            return Err(DbError::invalid_input(format!(
                "Too many columns ({}) for max params ({})",
                self.columns.len(),
                MAX_BIND_PARAMS
            )));
        }
        for (index, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(DbError::invalid_input(format!(
                    "Row {} has {} values, expected {}",
                    index,
                    row.len(),
                    self.columns.len()
                )));
            }
        }
        Ok(())
    }

    /// Largest number of rows a single statement can carry.
    pub fn rows_per_statement(&self) -> usize {
        (MAX_BIND_PARAMS / self.columns.len().max(1)).max(1)
    }

    /// SQL text for a statement carrying `row_count` rows.
    pub fn statement_sql(&self, row_count: usize) -> String {
        let cols_len = self.columns.len();
        let quoted_cols = self
            .columns
            .iter()
            .map(|col| quote_ident(&col.name))
            .collect::<Vec<_>>()
            .join(", ");

        let casts: Vec<String> = self.columns.iter().map(UpsertColumn::cast_type).collect();
        let values_clause = (0..row_count)
            .map(|row| {
                let placeholders = casts
                    .iter()
                    .enumerate()
                    .map(|(col, cast)| format!("${}::{}", row * cols_len + col + 1, cast))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", placeholders)
            })
            .collect::<Vec<_>>()
            .join(", ");

        let conflict = self
            .conflict_columns
            .iter()
            .map(|c| quote_ident(c))
            .collect::<Vec<_>>()
            .join(", ");
        let assignments = self
            .columns
            .iter()
            .map(|col| {
                let quoted = quote_ident(&col.name);
                format!("{} = EXCLUDED.{}", quoted, quoted)
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "INSERT INTO {} ({}) VALUES {} ON CONFLICT ({}) DO UPDATE SET {}",
            self.table.quoted(),
            quoted_cols,
            values_clause,
            conflict,
            assignments
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(rows: Vec<Vec<Option<String>>>) -> UpsertPlan {
        UpsertPlan::new(
            TableRef::new("public", "stock"),
            vec![
                UpsertColumn::new("part_number", "pg_catalog", "text"),
                UpsertColumn::new("warehouse_no", "pg_catalog", "text"),
                UpsertColumn::new("qty", "pg_catalog", "numeric"),
            ],
            vec!["part_number".to_string(), "warehouse_no".to_string()],
            rows,
        )
    }

    #[test]
    fn statement_sql_casts_every_placeholder() {
        let sql = plan(Vec::new()).statement_sql(2);
        assert_eq!(
            sql,
            "INSERT INTO \"public\".\"stock\" (\"part_number\", \"warehouse_no\", \"qty\") \
             VALUES ($1::\"pg_catalog\".\"text\", $2::\"pg_catalog\".\"text\", $3::\"pg_catalog\".\"numeric\"), \
             ($4::\"pg_catalog\".\"text\", $5::\"pg_catalog\".\"text\", $6::\"pg_catalog\".\"numeric\") \
             ON CONFLICT (\"part_number\", \"warehouse_no\") DO UPDATE SET \
             \"part_number\" = EXCLUDED.\"part_number\", \"warehouse_no\" = EXCLUDED.\"warehouse_no\", \
             \"qty\" = EXCLUDED.\"qty\""
        );
    }

    #[test]
    fn validate_rejects_mismatched_row_len() {
        let err = plan(vec![vec![Some("P1".to_string())]])
            .validate()
            .unwrap_err();
        assert!(matches!(err, DbError::InvalidInput(_)));
    }

    #[test]
    fn validate_rejects_unknown_conflict_column() {
        let mut plan = plan(Vec::new());
        plan.conflict_columns.push("bin".to_string());
        assert!(plan.validate().is_err());
    }

    #[test]
    fn rows_per_statement_respects_param_limit() {
        assert_eq!(plan(Vec::new()).rows_per_statement(), MAX_BIND_PARAMS / 3);
    }
}
