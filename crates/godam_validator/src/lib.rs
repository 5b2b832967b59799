//! Row validation for GoDam uploads.
//!
//! [`RowValidator`] converts each input row against the target schema and
//! reference sets, collecting [`Violation`]s rather than stopping at the
//! first one. [`validate_batch`] then applies the business-key rules and
//! partitions the batch into accepted and rejected rows.

pub mod batch;
pub mod duplicates;
pub mod row;
pub mod violation;

pub use batch::{validate_batch, AcceptedRow, OutcomeCounts, RejectedRow, ValidationOutcome};
pub use duplicates::{Admission, DuplicateKeyTracker};
pub use row::{RowValidator, ValidatedRow};
pub use violation::{join_reasons, Violation};
