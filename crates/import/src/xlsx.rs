use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Timelike;
use rust_decimal::Decimal;
use std::io::Cursor;

use crate::csv::ReadError;
use crate::table::{Cell, RawTable};

/// Reads the first worksheet of a spreadsheet. The first non-empty row is
/// the header.
pub fn read_xlsx(bytes: &[u8]) -> Result<RawTable, ReadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| ReadError::Spreadsheet(e.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ReadError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| ReadError::Spreadsheet(e.to_string()))?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(to_cell).collect::<Vec<Cell>>())
        .filter(|row| !row.iter().all(Cell::is_empty));

    let headers: Vec<String> = rows
        .next()
        .ok_or(ReadError::NoHeader)?
        .iter()
        .map(|c| c.to_string().trim().to_string())
        .collect();

    Ok(RawTable::new(headers, rows.collect()))
}

fn to_cell(data: &Data) -> Cell {
    match data {
        Data::Empty => Cell::Empty,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::from(s.as_str()),
        Data::Int(i) => Cell::Number(Decimal::from(*i)),
        Data::Float(f) => Decimal::try_from(*f)
            .map(Cell::Number)
            .unwrap_or(Cell::Empty),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) if ndt.num_seconds_from_midnight() == 0 => Cell::Date(ndt.date()),
            Some(ndt) => Cell::DateTime(ndt),
            None => Cell::Empty,
        },
        Data::Error(_) => Cell::Empty,
    }
}
