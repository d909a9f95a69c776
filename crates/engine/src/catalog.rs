use serde::{Deserialize, Serialize};

/// One commodity reference line: canonical name plus the 10-digit
/// declaration code and its 6-digit heading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub code10: String,
    pub code6: String,
}

/// Commodity reference catalog, read-only after load. Entry order is the
/// source file order; the classifier scans it linearly and first match
/// wins, so order is part of the contract.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Catalog { entries }
    }

    /// Build from raw sheet rows (name, code10, code6), skipping the
    /// header row and rows without a name.
    pub fn from_rows(rows: &[Vec<String>]) -> Self {
        let entries = rows
            .iter()
            .skip(1)
            .filter(|row| !row.first().map(String::as_str).unwrap_or("").is_empty())
            .map(|row| CatalogEntry {
                name: row.first().cloned().unwrap_or_default(),
                code10: row.get(1).cloned().unwrap_or_default(),
                code6: row.get(2).cloned().unwrap_or_default(),
            })
            .collect();
        Catalog { entries }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
