use prefile_grid::Dataset;

use crate::catalog::Catalog;

/// Marker left in the code cell when no tier produced a classification.
pub const NO_MATCH: &str = "NO MATCH";

/// Most unmatched rows the fallback code may absorb in one run.
pub const UNMATCHED_LIMIT: usize = 5;

/// Applied to every sentinel when the unmatched count stays within
/// [`UNMATCHED_LIMIT`].
const FALLBACK_CODE: &str = "3926200000";

/// Forced onto rows whose pre-filled code starts with "73".
const FORCED_CODE: &str = "9607190000";

/// Description rewrites, applied in declaration order before any lookup.
/// Vendor vocabulary the destination customs office will not accept.
const REPLACEMENTS: &[(&str, &str)] = &[
    ("Medical ", ""),
    ("medical ", ""),
    ("cigarette", ""),
    ("Cigarette", ""),
    ("Excipients", "pipe"),
    ("gun", ""),
    ("hand shot", "simulation toy"),
    ("Night scope", "Telescope"),
    ("cellophane", "simulation toy"),
    ("antipyretic treasure", "pipe"),
    ("insect", ""),
    ("Breathalyzer", "instrument parts"),
    ("organic surfactant", "make up"),
    ("cat ", ""),
    ("respirator", "machine"),
    ("icide", "decoration parts"),
    ("Stuffed Animal", "Stuffed toy"),
    ("Fireworks", "decoration parts"),
    ("Building block", "brick part"),
    ("Flood", ""),
    ("Construction", "Component"),
    ("helmet", "plastic hat"),
    ("Soil tester", "tester"),
    ("Perfume", "make up"),
    ("perfume", "make up"),
    ("Baby ma3 jia3", "suit"),
    ("toy", "for fun"),
    ("Toy", "for fun"),
    ("Gift", ""),
    ("doll", "for play"),
    ("Doll", "for play"),
    ("Building block toy", "piece Component"),
];

/// Result of classifying one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyOutcome {
    /// Row numbers that no tier matched, in manifest order.
    pub unmatched_rows: Vec<usize>,
    /// True when the fallback code replaced the sentinels.
    pub fallback_applied: bool,
}

impl ClassifyOutcome {
    /// Too many unmatched rows for the fallback: the manifest must go to
    /// manual review with the sentinels left in place.
    pub fn needs_review(&self) -> bool {
        self.unmatched_rows.len() > UNMATCHED_LIMIT
    }
}

/// Classifies every data row of the manifest. The normalized description
/// is written back unconditionally; the code cell is resolved through the
/// tier chain. Per row: a code starting with "8" is accepted as-is, a code
/// starting with "73" is forced to [`FORCED_CODE`], otherwise the catalog
/// is scanned in file order and the first entry to match by exact name
/// (case-insensitive), by six-digit code prefix, or by substring in either
/// direction decides the row. Rows with no match get the [`NO_MATCH`]
/// sentinel; after the pass the sentinels are replaced with
/// [`FALLBACK_CODE`] unless there are more than [`UNMATCHED_LIMIT`] of
/// them.
pub fn classify(
    data: &mut Dataset,
    catalog: &Catalog,
    code_col: usize,
    description_col: usize,
) -> ClassifyOutcome {
    let lowered_names: Vec<String> = catalog
        .entries()
        .iter()
        .map(|entry| entry.name.to_lowercase())
        .collect();

    let mut unmatched_rows = Vec::new();
    for row in 2..=data.row_count() {
        let description = normalize_description(data.cell(row, description_col));
        data.set_cell(row, description_col, description.clone());

        let code = data.cell(row, code_col).to_string();
        if code.starts_with('8') {
            continue;
        }
        if code.starts_with("73") {
            data.set_cell(row, code_col, FORCED_CODE);
            continue;
        }

        let lowered_description = description.to_lowercase();
        let mut matched = false;
        for (entry, lowered_name) in catalog.entries().iter().zip(&lowered_names) {
            if lowered_description == *lowered_name {
                data.set_cell(row, code_col, entry.code10.clone());
                matched = true;
                break;
            }
            // Short codes fail the probe instead of panicking.
            if code.get(0..6) == Some(entry.code6.as_str()) {
                matched = true;
                break;
            }
            if lowered_description.contains(lowered_name)
                || lowered_name.contains(&lowered_description)
            {
                data.set_cell(row, code_col, entry.code10.clone());
                matched = true;
                break;
            }
        }
        if !matched {
            data.set_cell(row, code_col, NO_MATCH);
            unmatched_rows.push(row);
        }
    }

    let fallback_applied = !unmatched_rows.is_empty() && unmatched_rows.len() <= UNMATCHED_LIMIT;
    if fallback_applied {
        for &row in &unmatched_rows {
            data.set_cell(row, code_col, FALLBACK_CODE);
        }
    }

    ClassifyOutcome {
        unmatched_rows,
        fallback_applied,
    }
}

fn normalize_description(description: &str) -> String {
    let mut text = description.to_string();
    for (pattern, replacement) in REPLACEMENTS {
        text = text.replace(pattern, replacement);
    }
    text
}
