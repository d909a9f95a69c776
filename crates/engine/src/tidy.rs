use prefile_grid::Dataset;

use crate::columns::ColumnProfile;
use crate::numeric::{format_number, parse_decimal};

pub const CITY_DEFAULT: &str = "zhaoqing";
pub const POSTCODE_DEFAULT: &str = "526200";

const CONSIGNEE_HEADER: &str = "ConsigneeID";
const UNLOCODE_HEADER: &str = "UNLOcode";

/// Removes the trailing manifest row when its probe cell is empty. Export
/// feeds end with a stub totals row that must not reach the declaration.
pub fn trim_trailing_row(data: &mut Dataset, probe_col: usize) -> bool {
    let last = data.row_count();
    if last >= 2 && data.cell(last, probe_col).is_empty() {
        data.remove_row(last);
        return true;
    }
    false
}

/// Drops an administrative column the customer sometimes injects, keyed
/// on its header text.
pub fn remove_admin_column(data: &mut Dataset, col: usize, header: &str) -> bool {
    if data.header(col) == header {
        data.remove_column(col);
        return true;
    }
    false
}

/// Manifest scrub for the LGG-family layout. Per row: strip `%` from the
/// order number and ` kft` from the buyer name (both cells rewritten when
/// either is dirty); when the origin-city cell is empty, fill the
/// city/postcode defaults, renumber the sequence cell with the data-row
/// index, and rewrite the declared value in canonical decimal form. With
/// `blank_consignee` set (every station but LGG itself) the consignee-id
/// and unlocode cells are cleared row by row, gated on their headers.
pub fn scrub_manifest(data: &mut Dataset, profile: &ColumnProfile, blank_consignee: bool) {
    let blank_cols = match (profile.consignee_id, profile.unlocode) {
        (Some(consignee), Some(unlocode)) if blank_consignee => {
            let gated = data.header(consignee) == CONSIGNEE_HEADER
                || data.header(unlocode) == UNLOCODE_HEADER;
            gated.then_some((consignee, unlocode))
        }
        _ => None,
    };

    for row in 2..=data.row_count() {
        if let Some((consignee, unlocode)) = blank_cols {
            data.set_cell(row, consignee, "");
            data.set_cell(row, unlocode, "");
        }

        if let Some(name_col) = profile.buyer_name {
            let order = data.cell(row, profile.order_number).to_string();
            let name = data.cell(row, name_col).to_string();
            if order.contains('%') || name.contains(" kft") {
                data.set_cell(row, profile.order_number, order.replace('%', ""));
                data.set_cell(row, name_col, name.replace(" kft", ""));
            }
        }

        if let Some(city_col) = profile.origin_city {
            if data.cell(row, city_col).is_empty() {
                data.set_cell(row, city_col, CITY_DEFAULT);
                if let Some(postcode_col) = profile.origin_postcode {
                    data.set_cell(row, postcode_col, POSTCODE_DEFAULT);
                }
                if let Some(sequence_col) = profile.sequence {
                    data.set_cell(row, sequence_col, (row - 1).to_string());
                }
                let value = parse_decimal(data.cell(row, profile.declared_value));
                data.set_cell(row, profile.declared_value, format_number(value));
            }
        }
    }
}

/// Origin fill for layouts without the full scrub: rows with an empty
/// origin-city cell get both defaults. The caller supplies the two
/// columns, which the OTP feed carries swapped.
pub fn fill_origin(data: &mut Dataset, city_col: usize, postcode_col: usize) {
    for row in 2..=data.row_count() {
        if data.cell(row, city_col).is_empty() {
            data.set_cell(row, city_col, CITY_DEFAULT);
            data.set_cell(row, postcode_col, POSTCODE_DEFAULT);
        }
    }
}
