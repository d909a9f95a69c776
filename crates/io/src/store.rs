// Dataset store: the product-facing load/save surface over xlsx and csv

use std::path::Path;

use prefile_engine::Catalog;
use prefile_grid::Dataset;

use crate::csv;
use crate::xlsx;

/// Load one sheet from an Excel workbook. `None` selects the first
/// sheet, which is where manifests and registers live.
pub fn load_sheet(path: &Path, name: Option<&str>) -> Result<Dataset, String> {
    let (sheets, _) = xlsx::import(path)?;
    match name {
        Some(wanted) => sheets
            .into_iter()
            .find(|sheet| sheet.name() == wanted)
            .ok_or_else(|| format!("Sheet '{}' not found in {}", wanted, path.display())),
        None => sheets
            .into_iter()
            .next()
            .ok_or_else(|| format!("No sheets in {}", path.display())),
    }
}

/// Save the transformed manifest as a single-sheet workbook.
pub fn save_sheet(path: &Path, data: &Dataset) -> Result<xlsx::ExportResult, String> {
    xlsx::export(path, &[data])
}

/// Save the manifest together with its package roll-up view as a second
/// sheet, the OTP filing shape.
pub fn save_with_package(
    path: &Path,
    manifest: &Dataset,
    package: &Dataset,
) -> Result<xlsx::ExportResult, String> {
    xlsx::export(path, &[manifest, package])
}

/// Load the commodity catalog. Brokers deliver it either as a workbook
/// (first sheet) or as a CSV extract; the extension decides.
pub fn load_catalog(path: &Path) -> Result<Catalog, String> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    let sheet = match extension.as_str() {
        "csv" | "txt" | "tsv" => csv::import(path)?,
        _ => load_sheet(path, None)?,
    };
    let catalog = Catalog::from_rows(sheet.rows());
    if catalog.is_empty() {
        return Err(format!("Catalog {} has no entries", path.display()));
    }
    Ok(catalog)
}

/// Load every register workbook that exists, in probe order. Waybills
/// are split across registers by station, so a lookup has to scan all
/// of them. Missing paths are skipped so one settings file can cover
/// month-over-month register rotations.
pub fn load_registers(
    paths: &[std::path::PathBuf],
) -> Result<Vec<(Dataset, std::path::PathBuf)>, String> {
    let mut registers = Vec::new();
    for path in paths {
        if path.exists() {
            registers.push((load_sheet(path, None)?, path.clone()));
        }
    }
    if registers.is_empty() {
        return Err(format!(
            "No register workbook found (probed {} path{})",
            paths.len(),
            if paths.len() == 1 { "" } else { "s" }
        ));
    }
    Ok(registers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
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
    fn test_load_sheet_by_name() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        let first = dataset("Sheet1", vec![vec!["a"]]);
        let second = dataset("package", vec![vec!["p"]]);
        save_with_package(&path, &first, &second).unwrap();

        let sheet = load_sheet(&path, Some("package")).unwrap();
        assert_eq!(sheet.cell(1, 1), "p");
        let err = load_sheet(&path, Some("missing")).unwrap_err();
        assert!(err.contains("not found"));
    }

    #[test]
    fn test_load_catalog_from_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(
            &path,
            "Name,Code10,Code6\nCeramic Mug,6912002100,691200\nSteel Clamp,7307190000,730719\n",
        )
        .unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()[0].name, "Ceramic Mug");
        assert_eq!(catalog.entries()[1].code6, "730719");
    }

    #[test]
    fn test_load_catalog_from_xlsx() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.xlsx");
        let sheet = dataset(
            "Sheet1",
            vec![
                vec!["Name", "Code10", "Code6"],
                vec!["Ceramic Mug", "6912002100", "691200"],
            ],
        );
        save_sheet(&path, &sheet).unwrap();

        let catalog = load_catalog(&path).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()[0].code10, "6912002100");
    }

    #[test]
    fn test_empty_catalog_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, "Name,Code10,Code6\n").unwrap();
        let err = load_catalog(&path).unwrap_err();
        assert!(err.contains("no entries"));
    }

    #[test]
    fn test_register_probe_skips_missing_and_keeps_order() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("2024-07.xlsx");
        let first = dir.path().join("lgg.xlsx");
        let second = dir.path().join("other.xlsx");
        save_sheet(&first, &dataset("awb list", vec![vec!["AWB"], vec!["999-45678903"]])).unwrap();
        save_sheet(&second, &dataset("awb list", vec![vec!["AWB"], vec!["999-22334455"]])).unwrap();

        let registers =
            load_registers(&[missing.clone(), first.clone(), second.clone()]).unwrap();
        assert_eq!(registers.len(), 2);
        assert_eq!(registers[0].1, first);
        assert_eq!(registers[1].1, second);
        assert_eq!(registers[1].0.cell(2, 1), "999-22334455");

        let err = load_registers(&[missing]).unwrap_err();
        assert!(err.contains("No register workbook"));
    }
}
