use std::collections::BTreeMap;

use prefile_grid::{Dataset, PackageKey};

use crate::error::EngineError;
use crate::numeric::{format_number, parse_decimal, round3};

/// Smallest net weight a row may carry into or out of an allocation.
pub const MIN_WEIGHT: f64 = 0.01;

/// Sheet name of the per-package summary derived by [`package_rollup`].
pub const PACKAGE_SHEET: &str = "package";

/// Spreads the chargeable weight minus one kilogram across all rows in
/// proportion to net weight, writing the allocation into a separate
/// column. During the sum pass any weight under [`MIN_WEIGHT`] counts as
/// [`MIN_WEIGHT`] and the clamp is written back to the net-weight cell;
/// the allocation itself still uses the raw weight, rounded to three
/// decimals and clamped to [`MIN_WEIGHT`].
pub fn prorate_side_column(
    data: &mut Dataset,
    net_col: usize,
    side_col: usize,
    billable: f64,
) -> Result<(), EngineError> {
    let mut weights: Vec<(usize, f64)> = Vec::new();
    let mut sum = 0.0;
    for row in 2..=data.row_count() {
        let raw = parse_decimal(data.cell(row, net_col));
        weights.push((row, raw));
        if raw < MIN_WEIGHT {
            data.set_cell(row, net_col, format_number(MIN_WEIGHT));
            sum += MIN_WEIGHT;
        } else {
            sum += raw;
        }
    }
    if sum == 0.0 {
        return Err(EngineError::ZeroNetWeight);
    }

    let coefficient = (billable - 1.0) / sum;
    for (row, raw) in weights {
        let mut allocated = round3(raw * coefficient);
        if allocated < MIN_WEIGHT {
            allocated = MIN_WEIGHT;
        }
        data.set_cell(row, side_col, format_number(allocated));
    }
    Ok(())
}

/// In-place variant: the allocation replaces the net weight itself,
/// carried at three decimals. The sum pass takes weights as they are;
/// the allocation is still clamped up to [`MIN_WEIGHT`].
pub fn prorate_in_place(
    data: &mut Dataset,
    net_col: usize,
    billable: f64,
) -> Result<(), EngineError> {
    let mut weights: Vec<(usize, f64)> = Vec::new();
    let mut sum = 0.0;
    for row in 2..=data.row_count() {
        let raw = parse_decimal(data.cell(row, net_col));
        weights.push((row, raw));
        sum += raw;
    }
    if sum == 0.0 {
        return Err(EngineError::ZeroNetWeight);
    }

    let coefficient = (billable - 1.0) / sum;
    for (row, raw) in weights {
        let mut allocated = round3(raw * coefficient);
        if allocated < MIN_WEIGHT {
            allocated = MIN_WEIGHT;
        }
        data.set_cell(row, net_col, format!("{allocated:.3}"));
    }
    Ok(())
}

/// Derives a per-package summary sheet: a copy of the manifest in which
/// every row's weight and value cells hold the totals of its package.
/// Rows of the same package all show the same pair. The source dataset
/// is left untouched.
pub fn package_rollup(
    data: &Dataset,
    package_col: usize,
    weight_col: usize,
    value_col: usize,
) -> Dataset {
    let mut totals: BTreeMap<PackageKey, (f64, f64)> = BTreeMap::new();
    for row in 2..=data.row_count() {
        let key = PackageKey::new(data.cell(row, package_col));
        let entry = totals.entry(key).or_insert((0.0, 0.0));
        entry.0 += parse_decimal(data.cell(row, weight_col));
        entry.1 += parse_decimal(data.cell(row, value_col));
    }

    let mut package = data.duplicate_as(PACKAGE_SHEET);
    for row in 2..=data.row_count() {
        let key = PackageKey::new(data.cell(row, package_col));
        if let Some(&(weight, value)) = totals.get(&key) {
            package.set_cell(row, weight_col, format_number(round3(weight)));
            package.set_cell(row, value_col, format_number(round3(value)));
        }
    }
    package
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(rows: Vec<Vec<&str>>) -> Dataset {
        let mut all = vec![vec![
            "Package".to_string(),
            "Net weight".to_string(),
            "Allocated".to_string(),
        ]];
        all.extend(
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect()),
        );
        Dataset::from_rows("Sheet1", all)
    }

    // ── Side-column allocation ──────────────────────────────────────────

    #[test]
    fn side_column_spreads_billable_minus_one() {
        let mut data = manifest(vec![vec!["P1", "2", ""], vec!["P2", "3", ""]]);
        prorate_side_column(&mut data, 2, 3, 10.0).unwrap();
        // Coefficient (10 - 1) / 5 = 1.8.
        assert_eq!(data.cell(2, 3), "3.6");
        assert_eq!(data.cell(3, 3), "5.4");
        // Net weights above the minimum are untouched.
        assert_eq!(data.cell(2, 2), "2");
        assert_eq!(data.cell(3, 2), "3");
    }

    #[test]
    fn side_column_allocations_cover_billable_minus_one() {
        let mut data = manifest(vec![
            vec!["P1", "1.25", ""],
            vec!["P2", "0.75", ""],
            vec!["P3", "2", ""],
        ]);
        prorate_side_column(&mut data, 2, 3, 7.5).unwrap();
        let total: f64 = (2..=4).map(|row| parse_decimal(data.cell(row, 3))).sum();
        assert!((total - 6.5).abs() < 1e-9);
        assert!((2..=4).all(|row| parse_decimal(data.cell(row, 3)) >= MIN_WEIGHT));
    }

    #[test]
    fn side_column_clamp_is_written_back_but_allocation_uses_raw() {
        let mut data = manifest(vec![vec!["P1", "0.001", ""], vec!["P2", "5", ""]]);
        prorate_side_column(&mut data, 2, 3, 10.0).unwrap();
        // The sum pass rewrote the tiny weight.
        assert_eq!(data.cell(2, 2), "0.01");
        // Raw 0.001 times 9 / 5.01 rounds to 0.002, then clamps up.
        assert_eq!(data.cell(2, 3), "0.01");
        assert_eq!(data.cell(3, 3), "8.982");
    }

    #[test]
    fn side_column_with_no_rows_is_fatal() {
        let mut data = manifest(vec![]);
        let err = prorate_side_column(&mut data, 2, 3, 10.0).unwrap_err();
        assert!(matches!(err, EngineError::ZeroNetWeight));
    }

    // ── In-place allocation ─────────────────────────────────────────────

    #[test]
    fn in_place_rescales_at_three_decimals() {
        let mut data = manifest(vec![vec!["P1", "2", ""], vec!["P2", "3", ""]]);
        prorate_in_place(&mut data, 2, 10.0).unwrap();
        assert_eq!(data.cell(2, 2), "3.600");
        assert_eq!(data.cell(3, 2), "5.400");
    }

    #[test]
    fn in_place_zero_sum_is_fatal() {
        let mut data = manifest(vec![vec!["P1", "0", ""], vec!["P2", "0", ""]]);
        let err = prorate_in_place(&mut data, 2, 10.0).unwrap_err();
        assert!(matches!(err, EngineError::ZeroNetWeight));
    }

    #[test]
    fn in_place_unparseable_weight_counts_as_zero() {
        let mut data = manifest(vec![vec!["P1", "n/a", ""], vec!["P2", "4", ""]]);
        prorate_in_place(&mut data, 2, 10.0).unwrap();
        // Zero allocation still lands on the floor.
        assert_eq!(data.cell(2, 2), "0.010");
        assert_eq!(data.cell(3, 2), "9.000");
    }

    #[test]
    fn in_place_allocation_is_clamped_to_the_minimum() {
        let mut data = manifest(vec![vec!["P1", "0.005", ""], vec!["P2", "5", ""]]);
        prorate_in_place(&mut data, 2, 5.0).unwrap();
        // Coefficient 4 / 5.005: the tiny row rounds to 0.004 and is
        // raised to the floor; the big row is unaffected.
        assert_eq!(data.cell(2, 2), "0.010");
        assert_eq!(data.cell(3, 2), "3.996");
        assert!((2..=3).all(|row| parse_decimal(data.cell(row, 2)) >= MIN_WEIGHT));
    }

    // ── Package rollup ──────────────────────────────────────────────────

    #[test]
    fn rollup_writes_package_totals_on_every_row() {
        let rows = vec![
            vec![
                "Package".to_string(),
                "Desc".to_string(),
                "Weight".to_string(),
                "Value".to_string(),
            ],
            vec![
                "PKG1".to_string(),
                "socks".to_string(),
                "1.5".to_string(),
                "10".to_string(),
            ],
            vec![
                "PKG1".to_string(),
                "hats".to_string(),
                "2.5".to_string(),
                "20".to_string(),
            ],
            vec![
                "PKG2".to_string(),
                "mugs".to_string(),
                "7".to_string(),
                "40".to_string(),
            ],
        ];
        let data = Dataset::from_rows("Sheet1", rows);
        let package = package_rollup(&data, 1, 3, 4);

        assert_eq!(package.name(), PACKAGE_SHEET);
        assert_eq!(package.cell(2, 3), "4");
        assert_eq!(package.cell(2, 4), "30");
        assert_eq!(package.cell(3, 3), "4");
        assert_eq!(package.cell(3, 4), "30");
        assert_eq!(package.cell(4, 3), "7");
        assert_eq!(package.cell(4, 4), "40");
        // Non-aggregated cells and the header carry over.
        assert_eq!(package.cell(2, 2), "socks");
        assert_eq!(package.cell(1, 3), "Weight");
        // The source manifest is untouched.
        assert_eq!(data.cell(2, 3), "1.5");
    }
}
