//! File-side collaborators of the upload pipeline.
//!
//! - [`read_input_table`]: `.csv`, `.xlsx` and `.xls` uploads into raw rows
//! - [`write_rejection_report`]: rejected rows plus reasons, as `.xlsx` or `.csv`

pub mod error;
pub mod format;
pub mod reader;
pub mod report;

pub use error::{SinkError, SinkResult};
pub use format::FileFormat;
pub use reader::{read_input_table, InputTable};
pub use report::{report_format, write_rejection_report, ReportRow, REASON_COLUMN};
