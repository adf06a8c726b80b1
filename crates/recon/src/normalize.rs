use crate::error::RowValidationError;
use crate::model::{CandidateRecord, Grid, ResolvedColumns};
use crate::similarity::clean_name;

/// Turn every data row into a candidate record.
///
/// Never fails: a row with an empty name, or with no readable value in any
/// mapped price column, carries a `validation_error` instead.
pub fn normalize_rows(grid: &Grid, cols: &ResolvedColumns) -> Vec<CandidateRecord> {
    grid.rows
        .iter()
        .map(|raw| {
            let name = clean_name(raw.cell(cols.name));
            let purchase_cents = cols.purchase.and_then(|i| parse_price_cents(raw.cell(i)));
            let sale_cents = cols.sale.and_then(|i| parse_price_cents(raw.cell(i)));
            let group_name = cols
                .group
                .map(|i| clean_name(raw.cell(i)))
                .filter(|g| !g.is_empty());

            let validation_error = if name.is_empty() {
                Some(RowValidationError::EmptyName)
            } else if purchase_cents.is_none() && sale_cents.is_none() {
                Some(RowValidationError::NoParsablePrice)
            } else {
                None
            };

            CandidateRecord {
                row: raw.row,
                name,
                purchase_cents,
                sale_cents,
                group_name,
                validation_error,
            }
        })
        .collect()
}

const CURRENCY_MARKERS: &[&str] = &["₺", "TL", "TRY", "$", "€", "£"];

/// Parse a non-negative decimal price into integer cents.
///
/// Accepts `12`, `12.5`, `12,50`, `1.234,50`, `1,234.50` and an optional
/// currency marker. With both separators present the last one is the decimal
/// point. A lone `.` followed by one group of three digits is a thousands
/// separator (`1.250` is 1250); any other lone separator is decimal. Rounds
/// half away from zero.
/// Returns `None` for blank, negative or malformed input.
pub fn parse_price_cents(raw: &str) -> Option<i64> {
    let mut s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '\u{a0}')
        .collect();
    for marker in CURRENCY_MARKERS {
        if let Some(idx) = find_ignore_ascii_case(&s, marker) {
            s.replace_range(idx..idx + marker.len(), "");
        }
    }
    if s.is_empty() {
        return None;
    }

    let decimal_sep = match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let sep = if dot > comma { '.' } else { ',' };
            if s.matches(sep).count() != 1 {
                return None;
            }
            Some(sep)
        }
        (Some(_), None) if s.matches('.').count() == 1 => {
            if is_dot_grouped(&s) {
                None
            } else {
                Some('.')
            }
        }
        (None, Some(_)) if s.matches(',').count() == 1 => Some(','),
        _ => None,
    };

    let (int_part, frac_part) = match decimal_sep {
        Some(sep) => {
            let idx = s.rfind(sep)?;
            (&s[..idx], &s[idx + 1..])
        }
        None => (s.as_str(), ""),
    };

    let int_digits: String = int_part.chars().filter(|c| *c != '.' && *c != ',').collect();
    if int_digits.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_digits.chars().all(|c| c.is_ascii_digit()) || !frac_part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let units: i64 = if int_digits.is_empty() { 0 } else { int_digits.parse().ok()? };
    let mut frac = frac_part.bytes().map(|b| (b - b'0') as i64);
    let tenths = frac.next().unwrap_or(0);
    let hundredths = frac.next().unwrap_or(0);
    let round_up = frac.next().map(|d| d >= 5).unwrap_or(false);

    units
        .checked_mul(100)?
        .checked_add(tenths * 10 + hundredths + i64::from(round_up))
}

/// `1.250`, `12.500`, `999.000`: a head of one to three digits without a
/// leading zero, then groups of exactly three digits.
fn is_dot_grouped(s: &str) -> bool {
    let mut parts = s.split('.');
    let head = parts.next().unwrap_or_default();
    let head_ok = (1..=3).contains(&head.len())
        && head.bytes().all(|b| b.is_ascii_digit())
        && !head.starts_with('0');
    let mut groups = 0;
    for group in parts {
        if group.len() != 3 || !group.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }
        groups += 1;
    }
    head_ok && groups > 0
}

fn find_ignore_ascii_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_ascii() {
        haystack.to_ascii_uppercase().find(&needle.to_ascii_uppercase())
    } else {
        haystack.find(needle)
    }
}

/// Render cents as a plain decimal (`1850` → `18.50`).
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}{}.{:02}", abs / 100, abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Grid;

    #[test]
    fn parse_plain_and_decimal() {
        assert_eq!(parse_price_cents("12"), Some(1200));
        assert_eq!(parse_price_cents("12.5"), Some(1250));
        assert_eq!(parse_price_cents("12,50"), Some(1250));
        assert_eq!(parse_price_cents(" 0,99 "), Some(99));
        assert_eq!(parse_price_cents(".5"), Some(50));
    }

    #[test]
    fn parse_grouped_thousands() {
        assert_eq!(parse_price_cents("1.234,50"), Some(123450));
        assert_eq!(parse_price_cents("1,234.50"), Some(123450));
        assert_eq!(parse_price_cents("1.234.567"), Some(123456700));
        assert_eq!(parse_price_cents("1 234,5"), Some(123450));
    }

    #[test]
    fn lone_dot_before_three_digits_groups_thousands() {
        assert_eq!(parse_price_cents("1.250"), Some(125000));
        assert_eq!(parse_price_cents("1.500 TL"), Some(150000));
        assert_eq!(parse_price_cents("999.000"), Some(99900000));
        assert_eq!(parse_price_cents("12.5"), Some(1250));
        assert_eq!(parse_price_cents("12.50"), Some(1250));
        assert_eq!(parse_price_cents("0.125"), Some(13));
        assert_eq!(parse_price_cents("1250.000"), Some(125000));
    }

    #[test]
    fn parse_currency_markers() {
        assert_eq!(parse_price_cents("₺15"), Some(1500));
        assert_eq!(parse_price_cents("15,00 TL"), Some(1500));
        assert_eq!(parse_price_cents("15 tl"), Some(1500));
        assert_eq!(parse_price_cents("$3.20"), Some(320));
    }

    #[test]
    fn parse_rounds_half_away_from_zero() {
        assert_eq!(parse_price_cents("10.0051"), Some(1001));
        assert_eq!(parse_price_cents("10.0049"), Some(1000));
        assert_eq!(parse_price_cents("10,005"), Some(1001));
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_price_cents(""), None);
        assert_eq!(parse_price_cents("   "), None);
        assert_eq!(parse_price_cents("abc"), None);
        assert_eq!(parse_price_cents("-5"), None);
        assert_eq!(parse_price_cents("TL"), None);
        assert_eq!(parse_price_cents("1.2.3,4,5"), None);
    }

    #[test]
    fn format_round_trip() {
        assert_eq!(format_cents(1850), "18.50");
        assert_eq!(format_cents(5), "0.05");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-199), "-1.99");
    }

    fn cols() -> ResolvedColumns {
        ResolvedColumns { name: 0, purchase: Some(1), sale: Some(2), group: Some(3) }
    }

    #[test]
    fn normalize_valid_row() {
        let grid = Grid::from_rows(&[
            &["Ürün", "Alış", "Satış", "Grup"],
            &["  Türk   Kahvesi ", "10", "15,50", " Sıcak İçecek "],
        ]);
        let records = normalize_rows(&grid, &cols());
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.row, 2);
        assert_eq!(r.name, "Türk Kahvesi");
        assert_eq!(r.purchase_cents, Some(1000));
        assert_eq!(r.sale_cents, Some(1550));
        assert_eq!(r.group_name.as_deref(), Some("Sıcak İçecek"));
        assert!(r.is_valid());
    }

    #[test]
    fn one_unparsable_price_keeps_row() {
        let grid = Grid::from_rows(&[&["Ürün", "Alış", "Satış", "Grup"], &["Çay", "n/a", "8", ""]]);
        let r = &normalize_rows(&grid, &cols())[0];
        assert_eq!(r.purchase_cents, None);
        assert_eq!(r.sale_cents, Some(800));
        assert_eq!(r.group_name, None);
        assert!(r.is_valid());
    }

    #[test]
    fn empty_name_flagged() {
        let grid = Grid::from_rows(&[&["Ürün", "Alış", "Satış", "Grup"], &["  ", "1", "2", ""]]);
        let r = &normalize_rows(&grid, &cols())[0];
        assert_eq!(r.validation_error, Some(RowValidationError::EmptyName));
    }

    #[test]
    fn no_price_flagged() {
        let grid = Grid::from_rows(&[&["Ürün", "Alış", "Satış", "Grup"], &["Çay", "", "x", ""]]);
        let r = &normalize_rows(&grid, &cols())[0];
        assert_eq!(r.validation_error, Some(RowValidationError::NoParsablePrice));
    }

    #[test]
    fn ragged_row_reads_blank_cells() {
        let grid = Grid::from_rows(&[&["Ürün", "Alış", "Satış", "Grup"], &["Çay", "3"]]);
        let r = &normalize_rows(&grid, &cols())[0];
        assert_eq!(r.purchase_cents, Some(300));
        assert_eq!(r.sale_cents, None);
        assert!(r.is_valid());
    }
}
