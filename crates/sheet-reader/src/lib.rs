//! Spreadsheet Export Reader
//!
//! Reads the first worksheet of a plant export (or a CSV file) into a
//! [`RawBatch`]: the first row is the header, blank rows are skipped.

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use data_validator::{RawBatch, RawRow, RawValue};
use std::io::{Cursor, Read, Seek};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

/// Errors while reading an export file
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Workbook has no worksheets")]
    NoSheets,

    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

/// Container format of an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetFormat {
    /// xlsx, xlsm, xlsb, xls or ods
    Workbook,
    Csv,
}

impl SheetFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Some(SheetFormat::Workbook),
            "csv" => Some(SheetFormat::Csv),
            _ => None,
        }
    }
}

/// Plant identifier encoded in an export's file name: the text before the first dot
pub fn plant_id_from_file_name(file_name: &str) -> Option<&str> {
    let base = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    match base.split('.').next() {
        Some(id) if !id.trim().is_empty() => Some(id),
        _ => None,
    }
}

/// Read an export file from disk
pub fn read_path(path: impl AsRef<Path>) -> Result<RawBatch, SheetError> {
    let path = path.as_ref();
    match SheetFormat::from_path(path) {
        Some(SheetFormat::Workbook) => read_workbook(open_workbook_auto(path)?),
        Some(SheetFormat::Csv) => {
            let reader = csv_builder().from_path(path)?;
            read_csv(reader)
        }
        None => Err(SheetError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Read an export already held in memory
pub fn read_bytes(bytes: &[u8], format: SheetFormat) -> Result<RawBatch, SheetError> {
    match format {
        SheetFormat::Workbook => read_workbook(open_workbook_auto_from_rs(Cursor::new(bytes))?),
        SheetFormat::Csv => read_csv(csv_builder().from_reader(bytes)),
    }
}

fn read_workbook<RS: Read + Seek>(mut workbook: Sheets<RS>) -> Result<RawBatch, SheetError> {
    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or(SheetError::NoSheets)?;
    let range = workbook.worksheet_range(&sheet_name)?;

    let (rows, cols) = range.get_size();
    debug!("Reading sheet '{}' ({} rows x {} columns)", sheet_name, rows, cols);

    // The range starts at the first used row, not necessarily row 0
    let first_row = range.start().map_or(0, |(row, _)| row as usize);
    Ok(assemble(range.rows().enumerate().map(|(i, row)| {
        (first_row + i, row.iter().map(cell_value).collect::<Vec<_>>())
    })))
}

fn cell_value(cell: &Data) -> RawValue {
    match cell {
        Data::Int(i) => RawValue::Number(*i as f64),
        Data::Float(f) => RawValue::Number(*f),
        Data::String(s) => RawValue::Text(s.clone()),
        Data::Bool(b) => RawValue::Bool(*b),
        // Serial day number; the validator converts it to a date
        Data::DateTime(dt) => RawValue::Number(dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => RawValue::Text(s.clone()),
        Data::Error(e) => RawValue::Text(e.to_string()),
        Data::Empty => RawValue::Empty,
    }
}

fn csv_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(false).flexible(true).trim(csv::Trim::All);
    builder
}

fn read_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<RawBatch, SheetError> {
    let mut rows = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // csv drops empty lines, so use the line a record started on
        let line = record
            .position()
            .map_or(i, |pos| (pos.line() as usize).saturating_sub(1));
        rows.push((
            line,
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        RawValue::Empty
                    } else {
                        RawValue::Text(field.to_string())
                    }
                })
                .collect::<Vec<_>>(),
        ));
    }
    Ok(assemble(rows.into_iter()))
}

/// Turn positional rows into a keyed batch using the first row as header.
///
/// Each row carries its zero-based line in the source. Rows keep their
/// position relative to the header so that errors point at the right line
/// even after blank rows are dropped.
fn assemble(mut rows: impl Iterator<Item = (usize, Vec<RawValue>)>) -> RawBatch {
    let (header_line, header): (usize, Vec<String>) = match rows.next() {
        Some((line, cells)) => (
            line,
            cells.iter().map(|c| c.to_string().trim().to_string()).collect(),
        ),
        None => return RawBatch::default(),
    };

    let mut columns: Vec<String> = Vec::new();
    for name in &header {
        if !name.is_empty() && !columns.contains(name) {
            columns.push(name.clone());
        }
    }

    let mut records = Vec::new();
    let mut positions = Vec::new();
    for (line, cells) in rows {
        if cells.iter().all(RawValue::is_blank) {
            continue;
        }
        let mut row = RawRow::new();
        for (name, value) in header.iter().zip(cells) {
            if !name.is_empty() {
                row.entry(name.clone()).or_insert(value);
            }
        }
        records.push(row);
        positions.push(line.saturating_sub(header_line + 1));
    }

    let batch = RawBatch::new(columns, records);
    if positions.iter().enumerate().any(|(i, p)| i != *p) {
        debug!("Blank rows skipped; keeping source positions");
        batch.with_source_rows(positions)
    } else {
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plant_id_from_file_name() {
        assert_eq!(plant_id_from_file_name("plant_3.xlsx"), Some("plant_3"));
        assert_eq!(plant_id_from_file_name("data/raw/plant_5.backup.xlsx"), Some("plant_5"));
        assert_eq!(plant_id_from_file_name(".xlsx"), None);
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(SheetFormat::from_path("plant_1.XLSX"), Some(SheetFormat::Workbook));
        assert_eq!(SheetFormat::from_path("plant_1.ods"), Some(SheetFormat::Workbook));
        assert_eq!(SheetFormat::from_path("plant_1.csv"), Some(SheetFormat::Csv));
        assert_eq!(SheetFormat::from_path("plant_1.txt"), None);
        assert_eq!(SheetFormat::from_path("plant_1"), None);
    }

    #[test]
    fn test_csv_bytes_become_batch() {
        let data = b"Fecha,Turno,Unidades,Rechazos,ParoMin\n2025-03-04, 2 ,500,10,15\n,,,,\n2025-03-05,1,,3,0\n";
        let batch = read_bytes(data, SheetFormat::Csv).unwrap();

        assert_eq!(batch.columns, vec!["Fecha", "Turno", "Unidades", "Rechazos", "ParoMin"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.rows[0]["Turno"], RawValue::Text("2".to_string()));
        assert_eq!(batch.rows[1]["Unidades"], RawValue::Empty);
    }

    #[test]
    fn test_blank_rows_keep_source_positions() {
        let data = b"Fecha,Turno\n2025-03-04,A\n,\n\n2025-03-05,B\n";
        let batch = read_bytes(data, SheetFormat::Csv).unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.source_row(0), 0);
        assert_eq!(batch.source_row(1), 3);
    }

    #[test]
    fn test_contiguous_rows_need_no_positions() {
        let data = b"Fecha,Turno\n2025-03-04,A\n2025-03-05,B\n";
        let batch = read_bytes(data, SheetFormat::Csv).unwrap();
        assert!(batch.source_rows.is_empty());
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let batch = assemble(
            vec![
                vec![
                    RawValue::from("Date"),
                    RawValue::Empty,
                    RawValue::from("Date"),
                ],
                vec![
                    RawValue::from("2025-03-04"),
                    RawValue::from("ignored"),
                    RawValue::from("2025-01-01"),
                ],
            ]
            .into_iter()
            .enumerate(),
        );
        assert_eq!(batch.columns, vec!["Date"]);
        assert_eq!(batch.rows[0].len(), 1);
        assert_eq!(batch.rows[0]["Date"], RawValue::from("2025-03-04"));
    }

    #[test]
    fn test_empty_input() {
        let batch = read_bytes(b"", SheetFormat::Csv).unwrap();
        assert!(batch.columns.is_empty());
        assert!(batch.is_empty());
    }

    #[test]
    fn test_unsupported_path() {
        let err = read_path("notes.txt").unwrap_err();
        assert!(matches!(err, SheetError::UnsupportedFormat(_)));
    }
}
