use serde::{Deserialize, Serialize};

/// Ordered rows of string cells backing one worksheet. Row 1 is the header.
///
/// All addressing is 1-based, matching spreadsheet conventions: `cell(2, 1)`
/// is the first data row's A-column cell. Reads outside the populated area
/// return the empty string; writes grow the dataset to fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    name: String,
    rows: Vec<Vec<String>>,
    cols: usize,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Dataset {
            name: name.into(),
            rows: Vec::new(),
            cols: 0,
        }
    }

    /// Build from a cell matrix, padding ragged rows to a rectangle.
    pub fn from_rows(name: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut rows = rows;
        for row in &mut rows {
            row.resize(cols, String::new());
        }
        Dataset {
            name: name.into(),
            rows,
            cols,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value at 1-based (row, column); empty string when out of bounds.
    pub fn cell(&self, row: usize, col: usize) -> &str {
        if row == 0 || col == 0 {
            return "";
        }
        self.rows
            .get(row - 1)
            .and_then(|r| r.get(col - 1))
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Header cell for a 1-based column (row 1).
    pub fn header(&self, col: usize) -> &str {
        self.cell(1, col)
    }

    /// Write a cell at 1-based (row, column), growing the grid as needed.
    /// Writes at row 0 or column 0 are ignored.
    pub fn set_cell(&mut self, row: usize, col: usize, value: impl Into<String>) {
        if row == 0 || col == 0 {
            return;
        }
        if col > self.cols {
            self.cols = col;
            for r in &mut self.rows {
                r.resize(col, String::new());
            }
        }
        while self.rows.len() < row {
            self.rows.push(vec![String::new(); self.cols]);
        }
        self.rows[row - 1][col - 1] = value.into();
    }

    /// Borrow one row (1-based) as a cell slice.
    pub fn row(&self, row: usize) -> Option<&[String]> {
        if row == 0 {
            return None;
        }
        self.rows.get(row - 1).map(Vec::as_slice)
    }

    /// Clone the full cell matrix. Transformation passes read this snapshot
    /// and write back by index, so a pass never reads its own writes.
    pub fn snapshot(&self) -> Vec<Vec<String>> {
        self.rows.clone()
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Remove a row (1-based); later rows shift up. No-op out of bounds.
    pub fn remove_row(&mut self, row: usize) {
        if row == 0 || row > self.rows.len() {
            return;
        }
        self.rows.remove(row - 1);
    }

    /// Remove a column (1-based); later columns shift left. No-op out of
    /// bounds.
    pub fn remove_column(&mut self, col: usize) {
        if col == 0 || col > self.cols {
            return;
        }
        for row in &mut self.rows {
            row.remove(col - 1);
        }
        self.cols -= 1;
    }

    /// Copy this dataset under another sheet name.
    pub fn duplicate_as(&self, name: impl Into<String>) -> Dataset {
        Dataset {
            name: name.into(),
            rows: self.rows.clone(),
            cols: self.cols,
        }
    }
}
