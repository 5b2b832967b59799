//! Reading uploads and writing reports on disk.

use godam_schema::{CellValue, RawCell};
use godam_sinks::{read_input_table, write_rejection_report, ReportRow, SinkError};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

#[test]
fn csv_upload_allows_ragged_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("upload.csv");
    std::fs::write(
        &path,
        "part_number , warehouse_no,qty\nP1,W1,10\nP2,W2\n,,\nP3,W3,1,extra\n",
    )
    .unwrap();

    let table = read_input_table(&path).unwrap();
    assert_eq!(table.headers, vec!["part_number", "warehouse_no", "qty"]);
    assert_eq!(table.len(), 3);
    assert_eq!(table.rows[0].get("qty"), Some(&RawCell::from("10")));
    assert_eq!(table.rows[1].get("qty"), None);
    assert_eq!(table.rows[2].line, 5);
}

#[test]
fn header_only_csv_has_no_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("empty.csv");
    std::fs::write(&path, "part_number,warehouse_no,qty\n").unwrap();

    let table = read_input_table(&path).unwrap();
    assert!(table.is_empty());
}

#[test]
fn xlsx_upload_keeps_typed_cells() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("upload.xlsx");
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.write_string(0, 0, "part_number").unwrap();
    sheet.write_string(0, 1, "qty").unwrap();
    sheet.write_string(0, 2, "active").unwrap();
    sheet.write_string(1, 0, "P1").unwrap();
    sheet.write_number(1, 1, 12.0).unwrap();
    sheet.write_boolean(1, 2, true).unwrap();
    workbook.save(&path).unwrap();

    let table = read_input_table(&path).unwrap();
    assert_eq!(table.len(), 1);
    let row = &table.rows[0];
    assert_eq!(row.get("part_number"), Some(&RawCell::from("P1")));
    assert_eq!(row.get("qty"), Some(&RawCell::Float(12.0)));
    assert_eq!(row.get("active"), Some(&RawCell::Bool(true)));
}

#[test]
fn unsupported_upload_is_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("upload.txt");
    std::fs::write(&path, "x").unwrap();
    assert!(matches!(
        read_input_table(&path),
        Err(SinkError::UnsupportedFormat { .. })
    ));
}

fn rejected_rows() -> (Vec<String>, Vec<ReportRow>) {
    let columns = vec!["part_number".to_string(), "qty".to_string()];
    let rows = vec![
        ReportRow {
            values: vec![CellValue::Text("P1".into()), CellValue::Text("abc".into())],
            reason: "qty: invalid integer".into(),
        },
        ReportRow {
            values: vec![CellValue::Null, CellValue::Integer(-3)],
            reason: "part_number is required; qty: value cannot be negative".into(),
        },
    ];
    (columns, rows)
}

#[test]
fn csv_report_has_reason_column() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("errors.csv");
    let (columns, rows) = rejected_rows();

    let written = write_rejection_report(&path, &columns, &rows).unwrap();
    assert_eq!(written, 2);

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "part_number,qty,godam_error_reason");
    assert_eq!(lines[1], "P1,abc,qty: invalid integer");
    assert_eq!(
        lines[2],
        ",-3,part_number is required; qty: value cannot be negative"
    );
    assert!(!dir.path().join(".errors.csv.tmp").exists());
}

#[test]
fn xlsx_report_reads_back() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("GoDAM_ErrorRows.xlsx");
    let (columns, rows) = rejected_rows();

    write_rejection_report(&path, &columns, &rows).unwrap();

    let table = read_input_table(&path).unwrap();
    assert_eq!(
        table.headers,
        vec!["part_number", "qty", "godam_error_reason"]
    );
    assert_eq!(table.len(), 2);
    assert_eq!(
        table.rows[0].get("godam_error_reason"),
        Some(&RawCell::from("qty: invalid integer"))
    );
    assert_eq!(table.rows[1].get("qty"), Some(&RawCell::Float(-3.0)));
}
