// Delimited text import (CSV / TSV / semicolon exports)

use std::path::Path;

use resortdesk_recon::{Grid, RawRow, RowNumber};

use crate::error::GridError;

pub fn read_csv(path: &Path) -> Result<Grid, GridError> {
    let bytes = std::fs::read(path).map_err(|source| GridError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_csv_bytes(&bytes)
}

pub fn parse_csv_bytes(bytes: &[u8]) -> Result<Grid, GridError> {
    let content = decode_text(bytes);
    let delimiter = sniff_delimiter(&content);
    parse_csv_str(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (semicolon, tab, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
pub fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b';', b'\t', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().filter(|l| !l.trim().is_empty()).take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // The header line must split for the delimiter to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Lines agreeing with the header's field count, weighted by that count.
        // Turkish exports use ';' with ',' decimals, so ';' is tried first and
        // wins ties.
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Decode file bytes to text.
///
/// Honors a UTF-8/UTF-16 BOM, then tries plain UTF-8, then falls back to
/// Windows-1254 (Turkish Excel "CSV (semicolon)" exports).
pub fn decode_text(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = encoding_rs::Encoding::for_bom(bytes) {
        let (decoded, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return decoded.into_owned();
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1254.decode(bytes);
            decoded.into_owned()
        }
    }
}

/// Parse delimited text. The first non-blank record is the header; row
/// numbers are the text line each record starts on.
pub fn parse_csv_str(content: &str, delimiter: u8) -> Result<Grid, GridError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut rows = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result.map_err(|e| GridError::Csv(e.to_string()))?;
        let cells: Vec<String> = record.iter().map(|c| c.trim().to_string()).collect();
        if cells.iter().all(|c| c.is_empty()) {
            continue;
        }
        let line = record
            .position()
            .map(|p| p.line() as RowNumber)
            .unwrap_or(idx as RowNumber + 1);
        match headers {
            None => headers = Some(cells),
            Some(_) => rows.push(RawRow::new(line, cells)),
        }
    }

    let headers = headers.ok_or(GridError::Empty)?;
    let delimiter = delimiter as char;
    tracing::debug!(columns = headers.len(), rows = rows.len(), %delimiter, "decoded delimited file");
    Ok(Grid::new(headers, rows))
}
