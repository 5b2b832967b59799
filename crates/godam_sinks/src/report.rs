//! Rejection report writer.
//!
//! One row per rejected input row: the schema columns with the values as
//! supplied, plus a trailing reason column. The file is staged under a
//! dot-prefixed temp name and renamed into place once complete.

use godam_schema::CellValue;
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{SinkError, SinkResult};
use crate::format::FileFormat;

pub const REASON_COLUMN: &str = "godam_error_reason";

/// A rejected row as written to the report.
#[derive(Debug, Clone)]
pub struct ReportRow {
    pub values: Vec<CellValue>,
    pub reason: String,
}

/// Report format for `path`. Only `.xlsx` and `.csv` can be written.
pub fn report_format(path: &Path) -> SinkResult<FileFormat> {
    match FileFormat::from_path(path)? {
        // No writer for the legacy format.
        FileFormat::Xls => Err(SinkError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
        format => Ok(format),
    }
}

/// Write `rows` to `path` as `.xlsx` or `.csv` (by extension).
///
/// Returns the number of data rows written.
pub fn write_rejection_report(
    path: &Path,
    columns: &[String],
    rows: &[ReportRow],
) -> SinkResult<u64> {
    let format = report_format(path)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| SinkError::io(parent, e))?;
    }

    let temp_path = temp_path_for(path);
    let written = match format {
        FileFormat::Csv => write_csv(&temp_path, columns, rows),
        _ => write_xlsx(&temp_path, columns, rows),
    };
    if let Err(err) = written {
        if temp_path.exists() {
            let _ = std::fs::remove_file(&temp_path);
            warn!("Removed partial report: {}", temp_path.display());
        }
        return Err(err);
    }

    std::fs::rename(&temp_path, path).map_err(|e| SinkError::io(path, e))?;
    info!(path = %path.display(), rows = rows.len(), "Wrote rejection report");
    Ok(rows.len() as u64)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.tmp", name))
}

fn header(columns: &[String]) -> impl Iterator<Item = &str> {
    columns
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(REASON_COLUMN))
}

fn write_csv(path: &Path, columns: &[String], rows: &[ReportRow]) -> SinkResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(header(columns))?;
    for row in rows {
        let mut record: Vec<String> = row
            .values
            .iter()
            .map(|v| v.to_sql_text().unwrap_or_default())
            .collect();
        record.resize(columns.len(), String::new());
        record.push(row.reason.clone());
        writer.write_record(&record)?;
    }
    writer.flush().map_err(|e| SinkError::io(path, e))?;
    Ok(())
}

fn write_xlsx(path: &Path, columns: &[String], rows: &[ReportRow]) -> SinkResult<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Rejected")?;

    let bold = Format::new().set_bold();
    for (col, name) in header(columns).enumerate() {
        sheet.write_string_with_format(0, col as u16, name, &bold)?;
    }

    let reason_col = columns.len() as u16;
    for (idx, row) in rows.iter().enumerate() {
        let line = idx as u32 + 1;
        for (col, value) in row.values.iter().take(columns.len()).enumerate() {
            write_value(sheet, line, col as u16, value)?;
        }
        sheet.write_string(line, reason_col, &row.reason)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_value(sheet: &mut Worksheet, row: u32, col: u16, value: &CellValue) -> SinkResult<()> {
    match value {
        CellValue::Null => {}
        CellValue::Integer(v) => {
            sheet.write_number(row, col, *v as f64)?;
        }
        CellValue::Decimal(v) if v.is_finite() => {
            sheet.write_number(row, col, *v)?;
        }
        CellValue::Boolean(v) => {
            sheet.write_boolean(row, col, *v)?;
        }
        other => {
            if let Some(text) = other.to_sql_text() {
                sheet.write_string(row, col, text)?;
            }
        }
    }
    Ok(())
}
