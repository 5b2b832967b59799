//! Upload reader: one rectangular table of header + raw cells.
//!
//! The whole file is materialized; rows are addressed by trimmed header name.

use calamine::{open_workbook_auto, Data, Reader};
use godam_schema::{RawCell, RawRow};
use std::path::Path;
use tracing::info;

use crate::error::{SinkError, SinkResult};
use crate::format::FileFormat;

/// Materialized upload.
#[derive(Debug, Clone, Default)]
pub struct InputTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl InputTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Build from a header row and data rows of raw cells.
    ///
    /// Line numbers count the header as line 1. Rows with no non-blank cell
    /// are skipped. Missing trailing cells are absent (read as null).
    pub fn from_grid(headers: Vec<String>, grid: impl IntoIterator<Item = Vec<RawCell>>) -> Self {
        let headers: Vec<String> = headers.into_iter().map(|h| h.trim().to_string()).collect();
        let rows = grid
            .into_iter()
            .enumerate()
            .filter(|(_, cells)| cells.iter().any(|c| !is_blank(c)))
            .map(|(idx, cells)| {
                RawRow::from_pairs(idx + 2, headers.iter().cloned().zip(cells))
            })
            .collect();
        Self { headers, rows }
    }
}

fn is_blank(cell: &RawCell) -> bool {
    match cell {
        RawCell::Empty => true,
        RawCell::Text(text) => text.trim().is_empty(),
        _ => false,
    }
}

/// Read a `.csv`, `.xlsx` or `.xls` upload.
pub fn read_input_table(path: &Path) -> SinkResult<InputTable> {
    let table = match FileFormat::from_path(path)? {
        FileFormat::Csv => read_csv(path)?,
        FileFormat::Xlsx | FileFormat::Xls => read_workbook(path)?,
    };
    info!(
        path = %path.display(),
        columns = table.headers.len(),
        rows = table.len(),
        "Read input table"
    );
    Ok(table)
}

fn read_csv(path: &Path) -> SinkResult<InputTable> {
    let file = std::fs::File::open(path).map_err(|e| SinkError::io(path, e))?;
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SinkError::EmptyHeader {
            path: path.to_path_buf(),
        });
    }

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(record.iter().map(RawCell::from).collect());
    }
    Ok(InputTable::from_grid(headers, grid))
}

fn read_workbook(path: &Path) -> SinkResult<InputTable> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| SinkError::NoWorksheet {
            path: path.to_path_buf(),
        })??;

    let mut rows = range.rows();
    let headers: Vec<String> = match rows.next() {
        Some(header) => header.iter().map(|c| c.to_string()).collect(),
        None => Vec::new(),
    };
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SinkError::EmptyHeader {
            path: path.to_path_buf(),
        });
    }

    let grid: Vec<Vec<RawCell>> = rows.map(|row| row.iter().map(raw_cell).collect()).collect();
    Ok(InputTable::from_grid(headers, grid))
}

fn raw_cell(cell: &Data) -> RawCell {
    match cell {
        Data::Empty => RawCell::Empty,
        Data::String(s) => RawCell::Text(s.clone()),
        Data::Int(v) => RawCell::Int(*v),
        Data::Float(v) => RawCell::Float(*v),
        Data::Bool(v) => RawCell::Bool(*v),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(naive) => RawCell::DateTime(naive),
            None => RawCell::Float(dt.as_f64()),
        },
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawCell::Text(s.clone()),
        Data::Error(e) => RawCell::Text(e.to_string()),
    }
}
