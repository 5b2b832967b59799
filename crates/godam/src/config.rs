//! Run configuration.

use godam_db::TableRef;
use std::path::PathBuf;

/// Default rejection report file name.
pub const DEFAULT_ERROR_OUTPUT: &str = "GoDAM_ErrorRows.xlsx";

/// Default table holding the existing stock snapshot.
pub const DEFAULT_STOCK_TABLE: &str = "stock";

/// Everything one validation run needs besides the database session.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub input: PathBuf,
    pub table: TableRef,
    pub stock_table: TableRef,
    pub error_output: PathBuf,
    /// Validate and report only, never write.
    pub dry_run: bool,
    /// Skip foreign-key discovery and membership checks.
    pub skip_fk_check: bool,
}

impl RunConfig {
    pub fn new(input: impl Into<PathBuf>, table: TableRef) -> Self {
        Self {
            input: input.into(),
            table,
            stock_table: TableRef::new(godam_db::DEFAULT_SCHEMA, DEFAULT_STOCK_TABLE),
            error_output: PathBuf::from(DEFAULT_ERROR_OUTPUT),
            dry_run: false,
            skip_fk_check: false,
        }
    }

    pub fn with_stock_table(mut self, stock_table: TableRef) -> Self {
        self.stock_table = stock_table;
        self
    }

    pub fn with_error_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.error_output = path.into();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn skip_fk_check(mut self, skip: bool) -> Self {
        self.skip_fk_check = skip;
        self
    }
}
