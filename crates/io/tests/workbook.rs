use std::path::Path;

use resortdesk_io::{read_grid, read_grid_from_bytes, GridError};
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

fn write_products(path: &Path) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Ürünler").unwrap();
    sheet.write_string(0, 0, "Ürün Adı").unwrap();
    sheet.write_string(0, 1, "Alış").unwrap();
    sheet.write_string(0, 2, "Satış").unwrap();
    sheet.write_string(1, 0, "Türk Kahvesi").unwrap();
    sheet.write_number(1, 1, 10.0).unwrap();
    sheet.write_number(1, 2, 22.5).unwrap();
    // Row 3 left blank on purpose.
    sheet.write_string(3, 0, " Çay ").unwrap();
    sheet.write_number(3, 2, 5.0).unwrap();

    let other = workbook.add_worksheet();
    other.write_string(0, 0, "ignored").unwrap();

    workbook.save(path).unwrap();
}

#[test]
fn first_sheet_with_spreadsheet_row_numbers() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("urunler.xlsx");
    write_products(&path);

    let grid = read_grid(&path).unwrap();
    assert_eq!(grid.headers, vec!["Ürün Adı", "Alış", "Satış"]);
    assert_eq!(grid.rows.len(), 2);

    assert_eq!(grid.rows[0].row, 2);
    assert_eq!(grid.rows[0].cells, vec!["Türk Kahvesi", "10", "22.5"]);

    assert_eq!(grid.rows[1].row, 4);
    assert_eq!(grid.rows[1].cell(0), "Çay");
    assert_eq!(grid.rows[1].cell(1), "");
    assert_eq!(grid.rows[1].cell(2), "5");
}

#[test]
fn bytes_and_path_agree() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("urunler.xlsx");
    write_products(&path);

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(read_grid_from_bytes(bytes, "xlsx").unwrap(), read_grid(&path).unwrap());
}

#[test]
fn empty_sheet_is_empty_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bos.xlsx");
    let mut workbook = Workbook::new();
    workbook.add_worksheet();
    workbook.save(&path).unwrap();

    assert!(matches!(read_grid(&path), Err(GridError::Empty)));
}

#[test]
fn unknown_extension_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("urunler.pdf");
    std::fs::write(&path, b"%PDF").unwrap();
    assert!(matches!(read_grid(&path), Err(GridError::UnsupportedFormat(_))));
}
