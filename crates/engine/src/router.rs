use std::collections::BTreeSet;

use prefile_grid::Dataset;

use crate::classifier::NO_MATCH;

/// Route classifications that trigger per-box warehouse assignment.
pub const ROUTE_MIX_LGG: &str = "LGGATP-MIX";
pub const ROUTE_MIX_SOB: &str = "SOBATP-MIX";
/// Route classification carrying the Athens hub note instead.
pub const ROUTE_ATH_BOX: &str = "ATHGRBOX";

const ACS_HUB: &str = "ACS  hub:Athens 36-38 Petrou Ralli Post code 12241 Athens";
const BOX_NOW_HUB: &str = "BOX NOW HUB:Street Tatoiou 96, Acharne, Attica 136 72";

const PREFIX_LEN: usize = 4;

struct WarehouseRule {
    prefix: &'static str,
    airtable_code: &'static str,
    warehouse: &'static str,
}

const WAREHOUSE_RULES: &[WarehouseRule] = &[
    WarehouseRule { prefix: "ATFA", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "ATFY", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "ATEA", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "LTIC", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "ATCD", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "ATFT", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "ATFH", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "WGAT", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "WXAT", airtable_code: "AT Post Kalsdorf TEMU", warehouse: "Karlsdorf" },
    WarehouseRule { prefix: "ATFL", airtable_code: "AT Post Vienna TEMU", warehouse: "Wien" },
    WarehouseRule { prefix: "ATFK", airtable_code: "AT Post Vienna TEMU", warehouse: "Wien" },
    WarehouseRule { prefix: "WRAT", airtable_code: "AT Post Vienna TEMU", warehouse: "Wien" },
    WarehouseRule { prefix: "WVAT", airtable_code: "AT Post Vienna TEMU", warehouse: "Wien" },
    WarehouseRule { prefix: "SOAT", airtable_code: "AT Post Allhaming TEMU", warehouse: "Allhaming" },
    WarehouseRule { prefix: "ATAY", airtable_code: "AT Post Allhaming TEMU", warehouse: "Allhaming" },
    WarehouseRule { prefix: "WSAT", airtable_code: "AT Post Allhaming TEMU", warehouse: "Allhaming" },
    WarehouseRule { prefix: "WJAT", airtable_code: "AT Post Allhaming TEMU", warehouse: "Allhaming" },
    WarehouseRule { prefix: "SRAT", airtable_code: "AT Post Hagenbrunn TEMU", warehouse: "Hagenbrunn" },
    WarehouseRule { prefix: "ATAT", airtable_code: "AT Post Hagenbrunn TEMU", warehouse: "Hagenbrunn" },
    WarehouseRule { prefix: "WYAT", airtable_code: "AT Post Hagenbrunn TEMU", warehouse: "Hagenbrunn" },
    WarehouseRule { prefix: "WNAT", airtable_code: "AT Post Hagenbrunn TEMU", warehouse: "Hagenbrunn" },
];

/// Warehouses in the order the register tally renders.
const TALLY_ORDER: [&str; 4] = ["Allhaming", "Hagenbrunn", "Karlsdorf", "Wien"];

/// Stamps every row's routing column with the airtable code matched from
/// the box number's four-character prefix, tallying each distinct box
/// number once under its warehouse. Unmatched prefixes (including box
/// numbers shorter than four characters) get the [`NO_MATCH`] marker and
/// count nothing. Returns the tally rendered in fixed warehouse order,
/// ready for the register's sorting-info cell. The caller gates on the
/// route code.
pub fn assign_warehouses(data: &mut Dataset, box_col: usize, routing_col: usize) -> String {
    let mut counts = [0usize; TALLY_ORDER.len()];
    let mut seen: BTreeSet<String> = BTreeSet::new();

    for row in 2..=data.row_count() {
        let box_number = data.cell(row, box_col).to_string();
        let rule = box_number
            .get(0..PREFIX_LEN)
            .and_then(|prefix| WAREHOUSE_RULES.iter().find(|rule| rule.prefix == prefix));
        match rule {
            Some(rule) => {
                data.set_cell(row, routing_col, rule.airtable_code);
                if seen.insert(box_number) {
                    if let Some(slot) = TALLY_ORDER.iter().position(|w| *w == rule.warehouse) {
                        counts[slot] += 1;
                    }
                }
            }
            None => data.set_cell(row, routing_col, NO_MATCH),
        }
    }

    TALLY_ORDER
        .iter()
        .zip(counts)
        .map(|(warehouse, count)| format!("\"{warehouse}\": {count}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Athens hub note, decided by the first data row's order-number prefix:
/// "76" consignments go through ACS, everything else through BOX NOW.
pub fn ath_hub_note(data: &Dataset, order_col: usize) -> String {
    let hub = if data.cell(2, order_col).get(0..2) == Some("76") {
        ACS_HUB
    } else {
        BOX_NOW_HUB
    };
    hub.to_string()
}
