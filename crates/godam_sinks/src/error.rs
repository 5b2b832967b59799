use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while reading uploads or writing reports.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Unsupported file format. Only .xlsx, .xls, and .csv are accepted.")]
    UnsupportedFormat { path: PathBuf },

    #[error("{}: file has no header row", .path.display())]
    EmptyHeader { path: PathBuf },

    #[error("{}: workbook has no worksheets", .path.display())]
    NoWorksheet { path: PathBuf },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook read error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("Workbook write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type SinkResult<T> = std::result::Result<T, SinkError>;

impl SinkError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SinkError::Io {
            path: path.into(),
            source,
        }
    }
}
