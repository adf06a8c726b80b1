use thiserror::Error;

use resortdesk_recon::ImportError;

/// Spreadsheet could not be turned into a grid.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(String),
    #[error("cannot open workbook: {0}")]
    Workbook(String),
    #[error("workbook contains no sheets")]
    NoSheets,
    #[error("empty file")]
    Empty,
    #[error("unsupported file type '{0}' (expected .xlsx, .xls, .csv)")]
    UnsupportedFormat(String),
}

impl From<GridError> for ImportError {
    fn from(err: GridError) -> Self {
        ImportError::FileParse(err.to_string())
    }
}
