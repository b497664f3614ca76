use std::io::Read;
use std::path::Path;
use thiserror::Error;

use crate::table::{Cell, RawTable};

#[derive(Error, Debug)]
pub enum ReadError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("File has no header row")]
    NoHeader,
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
}

/// Reads delimited text into a [`RawTable`]. The first record is the header.
pub fn read_csv<R: Read>(data: R, delimiter: u8) -> Result<RawTable, ReadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(data);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ReadError::NoHeader);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(Cell::from).collect());
    }

    Ok(RawTable::new(headers, rows))
}

/// Picks a reader from the file extension.
pub fn read_table(path: &Path, delimiter: u8) -> Result<RawTable, ReadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_lowercase();
    match ext.as_str() {
        "csv" | "txt" => read_csv(std::fs::File::open(path)?, delimiter),
        #[cfg(feature = "xlsx")]
        "xlsx" | "xls" | "ods" => crate::xlsx::read_xlsx(&std::fs::read(path)?),
        other => Err(ReadError::UnsupportedFormat(other.to_string())),
    }
}
