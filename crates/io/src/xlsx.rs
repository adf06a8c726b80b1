// Excel / OpenDocument import (xlsx, xlsm, xls, xlsb, ods) - first sheet only

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook_auto, open_workbook_auto_from_rs, Data, Reader, Sheets};
use resortdesk_recon::{Grid, RawRow, RowNumber};

use crate::error::GridError;

pub fn read_workbook(path: &Path) -> Result<Grid, GridError> {
    let mut workbook: Sheets<_> = open_workbook_auto(path).map_err(|e| GridError::Workbook(e.to_string()))?;
    first_sheet_grid(&mut workbook)
}

pub fn read_workbook_bytes(bytes: Vec<u8>) -> Result<Grid, GridError> {
    let mut workbook: Sheets<_> =
        open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(|e| GridError::Workbook(e.to_string()))?;
    first_sheet_grid(&mut workbook)
}

fn first_sheet_grid<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<Grid, GridError> {
    let sheet_name = workbook.sheet_names().first().cloned().ok_or(GridError::NoSheets)?;
    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| GridError::Workbook(format!("failed to read sheet '{}': {}", sheet_name, e)))?;

    // Range start offset (data may not begin at A1)
    let (start_row, _) = range.start().unwrap_or((0, 0));

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (row_idx, row) in range.rows().enumerate() {
        let cells: Vec<String> = row.iter().map(cell_text).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        let row_number = start_row as RowNumber + row_idx as RowNumber + 1;
        match headers {
            None => headers = Some(cells),
            Some(_) => rows.push(RawRow::new(row_number, cells)),
        }
    }

    let headers = headers.ok_or(GridError::Empty)?;
    tracing::debug!(sheet = %sheet_name, columns = headers.len(), rows = rows.len(), "decoded workbook");
    Ok(Grid::new(headers, rows))
}

/// Render a cell as the text a user would see in the sheet.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(n) => {
            // Format nicely: integers without decimals
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                // Cents precision; a third decimal would read as a thousands group
                let fixed = format!("{:.2}", n);
                fixed.trim_end_matches('0').trim_end_matches('.').to_string()
            }
        }
        Data::Int(n) => n.to_string(),
        Data::Bool(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Serial number; a date in a name or price column is junk either way
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
    }
}
