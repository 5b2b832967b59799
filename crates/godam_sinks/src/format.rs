//! File format detection by extension.

use std::path::Path;

use crate::error::{SinkError, SinkResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
}

impl FileFormat {
    /// Case-insensitive extension match.
    pub fn from_path(path: &Path) -> SinkResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("csv") => Ok(FileFormat::Csv),
            Some("xlsx") => Ok(FileFormat::Xlsx),
            Some("xls") => Ok(FileFormat::Xls),
            _ => Err(SinkError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn is_workbook(&self) -> bool {
        matches!(self, FileFormat::Xlsx | FileFormat::Xls)
    }
}
