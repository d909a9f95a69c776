use std::collections::BTreeMap;

use prefile_grid::{Dataset, OrderKey};

const MAX_IDENTITY_LEN: usize = 50;

/// Resolve one buyer name/address pair per order and stamp it onto every
/// row of that order. The first row seen for an order decides the pair:
/// blank fields are filled with opaque generated identifiers, and an
/// address without a decimal digit gets a literal "0" appended so every
/// address carries a house number. Recorded values are truncated to 50
/// characters before the digit check, so a normalized address may reach
/// 51.
pub fn synthesize(data: &mut Dataset, order_col: usize, name_col: usize, address_col: usize) {
    let rows = data.snapshot();
    let mut resolved: BTreeMap<OrderKey, (String, String)> = BTreeMap::new();

    for (i, row) in rows.iter().enumerate().skip(1) {
        let order = OrderKey::new(cell(row, order_col));
        let (name, address) = resolved
            .entry(order)
            .or_insert_with(|| {
                let mut name = truncate(cell(row, name_col));
                let mut address = truncate(cell(row, address_col));
                if name.is_empty() {
                    name = opaque_id();
                }
                if address.is_empty() {
                    address = opaque_id();
                }
                if !address.chars().any(|c| c.is_ascii_digit()) {
                    address.push('0');
                }
                (name, address)
            })
            .clone();

        let row_number = i + 1;
        data.set_cell(row_number, name_col, name);
        data.set_cell(row_number, address_col, address);
    }
}

fn cell(row: &[String], col: usize) -> &str {
    row.get(col - 1).map(String::as_str).unwrap_or("")
}

fn truncate(value: &str) -> String {
    value.chars().take(MAX_IDENTITY_LEN).collect()
}

fn opaque_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
