// Excel import (xlsx, xls, xlsb, ods) and export (xlsx only)
//
// Import: one-way conversion into the Dataset model. Every cell becomes
// a string; whole-number floats render without a trailing ".0" so order
// numbers and date serials survive as written.
// Export: the filing snapshot sent to handlers and brokers. Cells whose
// text round-trips through a decimal are written as numbers so totals
// keep working in Excel; everything else stays text.

use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use rust_xlsxwriter::Workbook as XlsxWorkbook;

use prefile_engine::numeric::format_number;
use prefile_grid::Dataset;

/// Maximum dimensions for an imported sheet. Manifests run to a few
/// thousand rows; anything past these bounds is truncated with a warning.
const MAX_ROWS: usize = 65536;
const MAX_COLS: usize = 256;

/// Per-file import statistics, surfaced by the CLI under `--verbose`.
#[derive(Debug, Default)]
pub struct ImportResult {
    pub sheets_imported: usize,
    pub cells_imported: usize,
    pub truncated: bool,
    pub warnings: Vec<String>,
}

#[derive(Debug, Default)]
pub struct ExportResult {
    pub sheets_exported: usize,
    pub cells_exported: usize,
    pub numbers_exported: usize,
}

/// Import every sheet of an Excel file.
pub fn import(path: &Path) -> Result<(Vec<Dataset>, ImportResult), String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    if sheet_names.is_empty() {
        return Err("Excel file contains no sheets".to_string());
    }

    let mut result = ImportResult::default();
    let mut sheets: Vec<Dataset> = Vec::new();

    for sheet_name in &sheet_names {
        let range = workbook
            .worksheet_range(sheet_name)
            .map_err(|e| format!("Failed to read sheet '{}': {}", sheet_name, e))?;

        let (height, width) = range.get_size();
        if height > MAX_ROWS || width > MAX_COLS {
            result.truncated = true;
            result.warnings.push(format!(
                "Sheet '{}' truncated from {}x{} to {}x{}",
                sheet_name,
                height,
                width,
                height.min(MAX_ROWS),
                width.min(MAX_COLS)
            ));
        }

        // Range start offset (data may not begin at A1)
        let (start_row, start_col) = range.start().unwrap_or((0, 0));

        let mut rows: Vec<Vec<String>> = Vec::new();
        for (row_idx, row) in range.rows().enumerate() {
            let target_row = start_row as usize + row_idx;
            if target_row >= MAX_ROWS {
                break;
            }
            for (col_idx, cell) in row.iter().enumerate() {
                let target_col = start_col as usize + col_idx;
                if target_col >= MAX_COLS {
                    break;
                }
                let value = stringify(cell);
                if !value.is_empty() {
                    if target_row >= rows.len() {
                        rows.resize(target_row + 1, Vec::new());
                    }
                    let slot = &mut rows[target_row];
                    if target_col >= slot.len() {
                        slot.resize(target_col + 1, String::new());
                    }
                    slot[target_col] = value;
                    result.cells_imported += 1;
                }
            }
        }

        sheets.push(Dataset::from_rows(sheet_name, rows));
        result.sheets_imported += 1;
    }

    Ok((sheets, result))
}

/// String form of one calamine cell, matching what the sheet displays.
fn stringify(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        // Integers render without decimals so identifiers survive
        Data::Float(n) => {
            if n.fract() == 0.0 && n.abs() < 1e15 {
                format!("{}", *n as i64)
            } else {
                format!("{}", n)
            }
        }
        Data::Int(n) => format!("{}", n),
        Data::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
        Data::Error(e) => format!("#{:?}", e),
        // Date serials stay serials; the waybill model converts them
        Data::DateTime(dt) => format!("{}", dt.as_f64()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
    }
}

/// Excel has 15 significant digits; longer integers must stay text or
/// they come back corrupted.
fn exceeds_excel_precision(n: f64) -> bool {
    n.abs() >= 1e15
}

/// Export datasets to an XLSX workbook, one worksheet per dataset, in
/// the given order.
pub fn export(path: &Path, sheets: &[&Dataset]) -> Result<ExportResult, String> {
    let mut result = ExportResult::default();
    let mut xlsx_workbook = XlsxWorkbook::new();

    for data in sheets {
        let worksheet = xlsx_workbook.add_worksheet();
        worksheet
            .set_name(data.name())
            .map_err(|e| format!("Failed to create sheet '{}': {}", data.name(), e))?;

        for row in 1..=data.row_count() {
            for col in 1..=data.column_count() {
                let value = data.cell(row, col);
                if value.is_empty() {
                    continue;
                }
                let row32 = (row - 1) as u32;
                let col16 = (col - 1) as u16;
                match as_exact_number(value) {
                    Some(n) => {
                        worksheet
                            .write_number(row32, col16, n)
                            .map_err(|e| format!("Failed to write cell ({}, {}): {}", row, col, e))?;
                        result.numbers_exported += 1;
                    }
                    None => {
                        worksheet
                            .write_string(row32, col16, value)
                            .map_err(|e| format!("Failed to write cell ({}, {}): {}", row, col, e))?;
                    }
                }
                result.cells_exported += 1;
            }
        }
        result.sheets_exported += 1;
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;
    Ok(result)
}

/// A cell value that can be written as a number without changing what
/// the sheet displays. Leading zeros, embedded text, and over-precision
/// identifiers all fail the round-trip and stay text.
fn as_exact_number(value: &str) -> Option<f64> {
    let n: f64 = value.parse().ok()?;
    if !n.is_finite() || exceeds_excel_precision(n) {
        return None;
    }
    (format_number(n) == value).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn dataset(name: &str, rows: Vec<Vec<&str>>) -> Dataset {
        Dataset::from_rows(
            name,
            rows.into_iter()
                .map(|row| row.into_iter().map(String::from).collect())
                .collect(),
        )
    }

    #[test]
    fn test_exact_number_detection() {
        assert_eq!(as_exact_number("76001"), Some(76001.0));
        assert_eq!(as_exact_number("3.6"), Some(3.6));
        assert_eq!(as_exact_number("0.01"), Some(0.01));
        // Leading zeros and text identifiers stay strings
        assert_eq!(as_exact_number("0076001"), None);
        assert_eq!(as_exact_number("ATFA0001"), None);
        assert_eq!(as_exact_number("3.600"), None);
        assert_eq!(as_exact_number(""), None);
        // Long parcel ids would lose digits as numbers
        assert_eq!(as_exact_number("7612345678901234567"), None);
    }

    #[test]
    fn test_xlsx_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.xlsx");

        let data = dataset(
            "Sheet1",
            vec![
                vec!["Order", "Value", "Box"],
                vec!["76001", "40.5", "ATFA0001"],
                vec!["0076002", "3.600", ""],
            ],
        );
        export(&path, &[&data]).unwrap();

        let (sheets, result) = import(&path).unwrap();
        assert_eq!(result.sheets_imported, 1);
        assert_eq!(sheets.len(), 1);
        let back = &sheets[0];
        assert_eq!(back.name(), "Sheet1");
        // Whole numbers come back without a decimal point
        assert_eq!(back.cell(2, 1), "76001");
        assert_eq!(back.cell(2, 2), "40.5");
        assert_eq!(back.cell(2, 3), "ATFA0001");
        // Text cells survive verbatim
        assert_eq!(back.cell(3, 1), "0076002");
        assert_eq!(back.cell(3, 2), "3.600");
    }

    #[test]
    fn test_two_sheet_export() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("manifest.xlsx");

        let manifest = dataset("Sheet1", vec![vec!["Order"], vec!["76001"]]);
        let package = dataset("package", vec![vec!["Pkg"], vec!["P1"]]);
        let result = export(&path, &[&manifest, &package]).unwrap();
        assert_eq!(result.sheets_exported, 2);

        let (sheets, _) = import(&path).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].name(), "Sheet1");
        assert_eq!(sheets[1].name(), "package");
        assert_eq!(sheets[1].cell(2, 1), "P1");
    }

    #[test]
    fn test_import_missing_file() {
        let err = import(Path::new("/nonexistent/missing.xlsx")).unwrap_err();
        assert!(err.contains("Failed to open"));
    }
}
