//! Batch-internal uniqueness of the business key.

use godam_schema::{BusinessKey, CellValue};
use std::collections::HashSet;

/// Result of offering a row's key to the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// First occurrence; the key is now taken.
    Admitted(BusinessKey),
    /// A key part is null or blank.
    MissingKey,
    /// An earlier admitted row already holds this key.
    Duplicate(BusinessKey),
}

/// Remembers every key admitted so far in one batch.
///
/// Only rows that passed cell validation are offered, so a rejected row never
/// reserves its key.
#[derive(Debug, Default)]
pub struct DuplicateKeyTracker {
    seen: HashSet<BusinessKey>,
}

impl DuplicateKeyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, part_number: &CellValue, warehouse_no: &CellValue) -> Admission {
        let Some(key) = BusinessKey::from_values(part_number, warehouse_no) else {
            return Admission::MissingKey;
        };
        if self.seen.insert(key.clone()) {
            Admission::Admitted(key)
        } else {
            Admission::Duplicate(key)
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
