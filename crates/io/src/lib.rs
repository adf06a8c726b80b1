// Spreadsheet decoding: file bytes in, import grid out

pub mod csv;
pub mod error;
pub mod xlsx;

use std::path::Path;

use resortdesk_recon::Grid;

pub use error::GridError;

/// File families the decoder understands, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpreadsheetFormat {
    Delimited,
    Workbook,
}

impl SpreadsheetFormat {
    pub fn from_extension(ext: &str) -> Result<Self, GridError> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" | "tsv" | "txt" => Ok(Self::Delimited),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Self::Workbook),
            other => Err(GridError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, GridError> {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }
}

/// Decode the first sheet of a spreadsheet file.
pub fn read_grid(path: &Path) -> Result<Grid, GridError> {
    match SpreadsheetFormat::from_path(path)? {
        SpreadsheetFormat::Delimited => csv::read_csv(path),
        SpreadsheetFormat::Workbook => xlsx::read_workbook(path),
    }
}

/// Decode an uploaded file held in memory; `ext` is the original extension.
pub fn read_grid_from_bytes(bytes: Vec<u8>, ext: &str) -> Result<Grid, GridError> {
    match SpreadsheetFormat::from_extension(ext)? {
        SpreadsheetFormat::Delimited => csv::parse_csv_bytes(&bytes),
        SpreadsheetFormat::Workbook => xlsx::read_workbook_bytes(bytes),
    }
}
