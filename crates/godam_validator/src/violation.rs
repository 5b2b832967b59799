//! Row-level violations.

use serde::Serialize;
use std::fmt;

/// One reason a row cannot be ingested. Never fatal to the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Violation {
    Required { column: String },
    InvalidType { column: String, declared_type: String },
    Negative { column: String },
    TooLong { column: String, max_length: i32 },
    MissingReference { column: String, reference: String },
    MissingBusinessKey,
    DuplicateKey,
}

impl Violation {
    /// Column the violation is attached to, if any.
    pub fn column(&self) -> Option<&str> {
        match self {
            Violation::Required { column }
            | Violation::InvalidType { column, .. }
            | Violation::Negative { column }
            | Violation::TooLong { column, .. }
            | Violation::MissingReference { column, .. } => Some(column),
            Violation::MissingBusinessKey | Violation::DuplicateKey => None,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Required { column } => write!(f, "{} is required", column),
            Violation::InvalidType {
                column,
                declared_type,
            } => write!(f, "{}: invalid {}", column, declared_type),
            Violation::Negative { column } => write!(f, "{}: value cannot be negative", column),
            Violation::TooLong { column, max_length } => {
                write!(f, "{}: exceeds max length {}", column, max_length)
            }
            Violation::MissingReference { column, reference } => {
                write!(f, "{}: missing FK {}", column, reference)
            }
            Violation::MissingBusinessKey => write!(f, "part_number and warehouse_no are required"),
            Violation::DuplicateKey => write!(f, "duplicate (part_number, warehouse_no) in upload"),
        }
    }
}

/// Join violations the way the rejection report shows them.
pub fn join_reasons(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
