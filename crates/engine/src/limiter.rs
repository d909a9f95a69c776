use std::collections::{BTreeMap, BTreeSet};

use base64::Engine;
use rand::RngCore;

use prefile_grid::{BuyerKey, Dataset, OrderKey};

use crate::error::EngineError;
use crate::numeric::parse_decimal;

const SUFFIX_LEN: usize = 5;

struct BuyerGroup {
    name: String,
    address: String,
    total: f64,
    rows: Vec<usize>,
    orders: BTreeSet<OrderKey>,
}

/// Identity-perturbation variant. Groups rows by the resolved buyer pair,
/// sums declared value, and when a group's total exceeds the cap appends
/// one short random suffix per distinct order number to both the name and
/// the address on every row of that order. Declared values are never
/// changed; the cap here is a per-declaration buyer-value rule, not a
/// per-shipment one.
pub fn perturb_over_cap(
    data: &mut Dataset,
    name_col: usize,
    address_col: usize,
    value_col: usize,
    order_col: usize,
    cap: f64,
) {
    let rows = data.snapshot();
    let mut groups: BTreeMap<BuyerKey, BuyerGroup> = BTreeMap::new();

    for (i, row) in rows.iter().enumerate().skip(1) {
        let name = cell(row, name_col);
        let address = cell(row, address_col);
        let amount = parse_decimal(cell(row, value_col));
        let order = OrderKey::new(cell(row, order_col));

        let group = groups
            .entry(BuyerKey::new(name, address))
            .or_insert_with(|| BuyerGroup {
                name: name.to_string(),
                address: address.to_string(),
                total: 0.0,
                rows: Vec::new(),
                orders: BTreeSet::new(),
            });
        group.total += amount;
        group.rows.push(i + 1);
        group.orders.insert(order);
    }

    for group in groups.values() {
        if group.total <= cap {
            continue;
        }
        let suffixes: BTreeMap<&OrderKey, String> = group
            .orders
            .iter()
            .map(|order| (order, random_suffix(SUFFIX_LEN)))
            .collect();

        for &row_number in &group.rows {
            let order = OrderKey::new(cell(&rows[row_number - 1], order_col));
            let Some(suffix) = suffixes.get(&order) else {
                continue;
            };
            data.set_cell(row_number, name_col, format!("{}{}", group.name, suffix));
            data.set_cell(row_number, address_col, format!("{}{}", group.address, suffix));
        }
    }
}

/// Proportional-shrink variant. Groups rows by order number and when a
/// group's total exceeds the cap replaces each row's value with
/// `floor(value * cap / total)`, so the new group total lands at or under
/// the cap. Writes integral strings so later stages read the shrunk
/// values.
pub fn shrink_over_cap(
    data: &mut Dataset,
    order_col: usize,
    value_col: usize,
    cap: f64,
) -> Result<(), EngineError> {
    if cap <= 0.0 {
        return Err(EngineError::InvalidCap { cap });
    }

    let rows = data.snapshot();
    let mut groups: BTreeMap<OrderKey, (f64, Vec<usize>)> = BTreeMap::new();

    for (i, row) in rows.iter().enumerate().skip(1) {
        let order = OrderKey::new(cell(row, order_col));
        let amount = parse_decimal(cell(row, value_col));
        let entry = groups.entry(order).or_insert_with(|| (0.0, Vec::new()));
        entry.0 += amount;
        entry.1.push(i + 1);
    }

    for (total, row_numbers) in groups.values() {
        if *total <= cap || *total <= 0.0 {
            continue;
        }
        // Ratio carried at four decimals, truncated: the rescaled total
        // can then never exceed the cap.
        let ratio = ((cap / total) * 10_000.0).floor() / 10_000.0;
        for &row_number in row_numbers {
            let old = parse_decimal(cell(&rows[row_number - 1], value_col));
            let new = (old * ratio).floor().max(0.0);
            data.set_cell(row_number, value_col, format!("{new:.0}"));
        }
    }
    Ok(())
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col - 1).map(String::as_str).unwrap_or("")
}

/// Short random identifier: random bytes through the URL-safe base64
/// alphabet, truncated to the requested length.
fn random_suffix(len: usize) -> String {
    let mut bytes = vec![0u8; (len * 3 + 3) / 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    let b64 = base64::engine::general_purpose::URL_SAFE_NO_PAD;
    let mut encoded = b64.encode(&bytes);
    encoded.truncate(len);
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(rows: Vec<Vec<&str>>) -> Dataset {
        let mut all = vec![vec![
            "Order".to_string(),
            "Name".to_string(),
            "Address".to_string(),
            "Value".to_string(),
        ]];
        all.extend(
            rows.into_iter()
                .map(|r| r.into_iter().map(String::from).collect()),
        );
        Dataset::from_rows("Sheet1", all)
    }

    // ── Proportional shrink ─────────────────────────────────────────────

    #[test]
    fn shrink_example_from_de_minimis_rule() {
        // Group total 180 over a 150 cap: ratio 0.8333, floor(60 * r) = 49.
        let mut data = manifest(vec![
            vec!["ORD1", "a", "b", "60"],
            vec!["ORD1", "a", "b", "60"],
            vec!["ORD1", "a", "b", "60"],
        ]);
        shrink_over_cap(&mut data, 1, 4, 150.0).unwrap();
        assert_eq!(data.cell(2, 4), "49");
        assert_eq!(data.cell(3, 4), "49");
        assert_eq!(data.cell(4, 4), "49");
    }

    #[test]
    fn shrink_leaves_groups_at_or_below_cap_alone() {
        let mut data = manifest(vec![
            vec!["ORD1", "a", "b", "75"],
            vec!["ORD1", "a", "b", "75"],
            vec!["ORD2", "a", "b", "200"],
        ]);
        shrink_over_cap(&mut data, 1, 4, 150.0).unwrap();
        // Exactly at cap: untouched.
        assert_eq!(data.cell(2, 4), "75");
        assert_eq!(data.cell(3, 4), "75");
        // Over cap: floor(200 * 150/200) = 150.
        assert_eq!(data.cell(4, 4), "150");
    }

    #[test]
    fn shrunk_total_never_exceeds_cap() {
        let mut data = manifest(vec![
            vec!["ORD1", "a", "b", "37"],
            vec!["ORD1", "a", "b", "41"],
            vec!["ORD1", "a", "b", "53"],
            vec!["ORD1", "a", "b", "29"],
        ]);
        shrink_over_cap(&mut data, 1, 4, 100.0).unwrap();
        let new_total: f64 = (2..=5).map(|r| data.cell(r, 4).parse::<f64>().unwrap()).sum();
        assert!(new_total <= 100.0, "total {new_total} exceeds cap");
        assert!(new_total < 160.0);
    }

    #[test]
    fn shrink_treats_unparseable_values_as_zero() {
        let mut data = manifest(vec![
            vec!["ORD1", "a", "b", "n/a"],
            vec!["ORD1", "a", "b", "200"],
        ]);
        shrink_over_cap(&mut data, 1, 4, 150.0).unwrap();
        // Total counts only the parseable 200.
        assert_eq!(data.cell(2, 4), "0");
        assert_eq!(data.cell(3, 4), "150");
    }

    #[test]
    fn shrink_rejects_nonpositive_cap() {
        let mut data = manifest(vec![vec!["ORD1", "a", "b", "10"]]);
        let err = shrink_over_cap(&mut data, 1, 4, 0.0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidCap { .. }));
    }

    // ── Identity perturbation ───────────────────────────────────────────

    #[test]
    fn perturbation_below_cap_is_idempotent() {
        let mut data = manifest(vec![
            vec!["ORD1", "Jane", "1 Main", "70"],
            vec!["ORD2", "Jane", "1 Main", "80"],
        ]);
        perturb_over_cap(&mut data, 2, 3, 4, 1, 150.0);
        assert_eq!(data.cell(2, 2), "Jane");
        assert_eq!(data.cell(3, 3), "1 Main");
    }

    #[test]
    fn perturbation_splits_buyer_by_order() {
        let mut data = manifest(vec![
            vec!["ORD1", "Jane", "1 Main", "90"],
            vec!["ORD1", "Jane", "1 Main", "20"],
            vec!["ORD2", "Jane", "1 Main", "80"],
        ]);
        perturb_over_cap(&mut data, 2, 3, 4, 1, 150.0);

        let name_a = data.cell(2, 2).to_string();
        let name_b = data.cell(4, 2).to_string();
        // Suffix appended to both fields, identical within an order.
        assert_eq!(name_a.len(), "Jane".len() + SUFFIX_LEN);
        assert_eq!(data.cell(3, 2), name_a);
        assert_eq!(data.cell(2, 3), format!("1 Main{}", &name_a["Jane".len()..]));
        // Different orders get different suffixes.
        assert_ne!(name_a, name_b);
        // Values are untouched.
        assert_eq!(data.cell(2, 4), "90");
        assert_eq!(data.cell(4, 4), "80");
    }

    #[test]
    fn perturbation_groups_by_identity_pair_not_order() {
        // Same order split across two buyers: neither buyer exceeds the cap.
        let mut data = manifest(vec![
            vec!["ORD1", "Jane", "1 Main", "90"],
            vec!["ORD1", "John", "2 Main", "90"],
        ]);
        perturb_over_cap(&mut data, 2, 3, 4, 1, 150.0);
        assert_eq!(data.cell(2, 2), "Jane");
        assert_eq!(data.cell(3, 2), "John");
    }

    #[test]
    fn random_suffix_has_requested_length() {
        for _ in 0..16 {
            let suffix = random_suffix(SUFFIX_LEN);
            assert_eq!(suffix.len(), SUFFIX_LEN);
            assert!(suffix.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }
}
