//! Whole-batch validation: per-row checks followed by key deduplication.

use godam_schema::{BusinessKey, CellValue, ExistingKeyMap, RawRow};
use serde::Serialize;
use tracing::{debug, info};

use crate::duplicates::{Admission, DuplicateKeyTracker};
use crate::row::{RowValidator, ValidatedRow};
use crate::violation::{join_reasons, Violation};

/// A row cleared for ingestion.
#[derive(Debug, Clone)]
pub struct AcceptedRow {
    pub line: usize,
    pub key: BusinessKey,
    pub values: Vec<CellValue>,
    /// Stored quantity when the key already exists in the stock table.
    /// Outer `None`: new key.
    pub existing_qty: Option<Option<String>>,
}

impl AcceptedRow {
    pub fn is_update(&self) -> bool {
        self.existing_qty.is_some()
    }

    /// Values as SQL text parameters, in schema order.
    pub fn sql_values(&self) -> Vec<Option<String>> {
        self.values.iter().map(CellValue::to_sql_text).collect()
    }
}

/// A row excluded from ingestion along with every reason.
#[derive(Debug, Clone)]
pub struct RejectedRow {
    pub line: usize,
    pub values: Vec<CellValue>,
    pub violations: Vec<Violation>,
}

impl RejectedRow {
    /// Semicolon-joined reasons, as written to the report.
    pub fn reason(&self) -> String {
        join_reasons(&self.violations)
    }
}

/// Partition of the input batch.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// In input order; no two share a business key.
    pub accepted: Vec<AcceptedRow>,
    pub rejected: Vec<RejectedRow>,
}

impl ValidationOutcome {
    pub fn total(&self) -> usize {
        self.accepted.len() + self.rejected.len()
    }

    pub fn updated(&self) -> usize {
        self.accepted.iter().filter(|row| row.is_update()).count()
    }

    pub fn inserted(&self) -> usize {
        self.accepted.len() - self.updated()
    }

    pub fn counts(&self) -> OutcomeCounts {
        OutcomeCounts {
            input_rows: self.total(),
            accepted: self.accepted.len(),
            rejected: self.rejected.len(),
            updated: self.updated(),
            inserted: self.inserted(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeCounts {
    pub input_rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub updated: usize,
    pub inserted: usize,
}

/// Validate every row in input order and partition the batch.
pub fn validate_batch(
    validator: &RowValidator<'_>,
    rows: &[RawRow],
    existing: &ExistingKeyMap,
) -> ValidationOutcome {
    let keys = validator.key_columns();
    let mut tracker = DuplicateKeyTracker::new();
    let mut outcome = ValidationOutcome::default();

    for raw in rows {
        let ValidatedRow {
            line,
            values,
            mut violations,
        } = validator.validate_row(raw);

        if violations.is_empty() {
            match tracker.admit(&values[keys.part_number], &values[keys.warehouse_no]) {
                Admission::Admitted(key) => {
                    let existing_qty = existing.get(&key).map(|qty| qty.map(str::to_string));
                    if let Some(qty) = &existing_qty {
                        info!(
                            "Updating existing stock for {} (current qty={})",
                            key,
                            qty.as_deref().unwrap_or("NULL")
                        );
                    }
                    outcome.accepted.push(AcceptedRow {
                        line,
                        key,
                        values,
                        existing_qty,
                    });
                    continue;
                }
                Admission::MissingKey => violations.push(Violation::MissingBusinessKey),
                Admission::Duplicate(_) => violations.push(Violation::DuplicateKey),
            }
        }

        let rejected = RejectedRow {
            line,
            values,
            violations,
        };
        debug!(line, reason = %rejected.reason(), "Row rejected");
        outcome.rejected.push(rejected);
    }

    info!(
        accepted = outcome.accepted.len(),
        rejected = outcome.rejected.len(),
        updated = outcome.updated(),
        "Validation complete"
    );
    outcome
}
