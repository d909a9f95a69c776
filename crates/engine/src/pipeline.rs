use std::fmt;
use std::str::FromStr;

use prefile_grid::Dataset;

use crate::catalog::Catalog;
use crate::classifier::{self, UNMATCHED_LIMIT};
use crate::columns::ColumnProfile;
use crate::error::EngineError;
use crate::identity;
use crate::limiter;
use crate::proration;
use crate::router;
use crate::tidy;
use crate::waybill::WaybillRecord;

/// Arrival station, read from the waybill register. Selects the pipeline
/// regime and the default column profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Station {
    Lgg,
    Ath,
    Sob,
    Beg,
    Otp,
}

impl Station {
    pub fn from_code(code: &str) -> Option<Station> {
        match code {
            "LGG" => Some(Station::Lgg),
            "ATH" => Some(Station::Ath),
            "SOB" => Some(Station::Sob),
            "BEG" => Some(Station::Beg),
            "OTP" => Some(Station::Otp),
            _ => None,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Station::Lgg => "LGG",
            Station::Ath => "ATH",
            Station::Sob => "SOB",
            Station::Beg => "BEG",
            Station::Otp => "OTP",
        }
    }

    /// Built-in manifest layout for the station. ATH and SOB feeds share
    /// the LGG layout.
    pub fn default_profile(&self) -> ColumnProfile {
        match self {
            Station::Lgg | Station::Ath | Station::Sob => ColumnProfile::lgg(),
            Station::Beg => ColumnProfile::beg(),
            Station::Otp => ColumnProfile::otp(),
        }
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Station {
    type Err = EngineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Station::from_code(raw.trim().to_uppercase().as_str()).ok_or_else(|| {
            EngineError::UnknownStation {
                code: raw.to_string(),
            }
        })
    }
}

/// Inputs the caller assembles for one manifest transformation.
pub struct StationRun<'a> {
    pub station: Station,
    pub profile: ColumnProfile,
    pub catalog: &'a Catalog,
    /// De-minimis cap for the buyer-grouped limiter.
    pub buyer_cap: f64,
    /// Cap for the proportional shrink, unit price times exchange rate.
    /// Only the BEG pipeline reads it.
    pub shrink_cap: f64,
}

/// What one pipeline run did, for the caller's summary and save plan.
#[derive(Debug, Default)]
pub struct ManifestReport {
    pub data_rows: usize,
    pub trimmed_trailing_row: bool,
    pub admin_column_removed: bool,
    pub unmatched_rows: usize,
    pub fallback_applied: bool,
    /// Tally or hub note written to the register's sorting-info cell.
    pub sorting_info: Option<String>,
    /// Per-package summary sheet derived by the OTP pipeline, saved as a
    /// second sheet next to the manifest.
    pub package_view: Option<Dataset>,
    /// The register row changed and needs saving.
    pub register_dirty: bool,
}

/// Runs the station's pipeline over the manifest in place. Stages are
/// strictly sequential; each stage's writes are visible to the next
/// through the dataset. A classification escalation aborts the remaining
/// stages with the sentinels already persisted in the dataset, so the
/// caller can save what it has and halt that manifest.
pub fn run_station(
    run: &StationRun<'_>,
    data: &mut Dataset,
    register: &mut Dataset,
    record: &WaybillRecord,
) -> Result<ManifestReport, EngineError> {
    if data.row_count() < 2 {
        return Err(EngineError::EmptyManifest);
    }

    let mut report = ManifestReport::default();
    match run.station {
        Station::Lgg | Station::Ath | Station::Sob => {
            run_lgg_family(run, data, register, record, &mut report)?;
        }
        Station::Beg => run_beg(run, data, &mut report)?,
        Station::Otp => run_otp(run, data, record, &mut report)?,
    }
    report.data_rows = data.row_count().saturating_sub(1);
    Ok(report)
}

fn run_lgg_family(
    run: &StationRun<'_>,
    data: &mut Dataset,
    register: &mut Dataset,
    record: &WaybillRecord,
    report: &mut ManifestReport,
) -> Result<(), EngineError> {
    let profile = &run.profile;
    report.trimmed_trailing_row = tidy::trim_trailing_row(data, profile.trailing_probe);

    classify_stage(run, data, report)?;

    if let (Some(col), Some(header)) = (profile.admin_column, profile.admin_header.as_deref()) {
        report.admin_column_removed = tidy::remove_admin_column(data, col, header);
    }

    tidy::scrub_manifest(data, profile, run.station != Station::Lgg);

    if let Some((name_col, address_col)) = profile.buyer_columns() {
        identity::synthesize(data, profile.order_number, name_col, address_col);
    }

    let sorting = match run.station {
        Station::Ath if record.route_code == router::ROUTE_ATH_BOX => {
            Some(router::ath_hub_note(data, profile.order_number))
        }
        Station::Lgg | Station::Sob
            if record.route_code == router::ROUTE_MIX_LGG
                || record.route_code == router::ROUTE_MIX_SOB =>
        {
            match (profile.box_number, profile.routing) {
                (Some(box_col), Some(routing_col)) => {
                    Some(router::assign_warehouses(data, box_col, routing_col))
                }
                _ => None,
            }
        }
        _ => None,
    };
    if let Some(info) = sorting {
        let (row, col) = record.sorting_info_cell();
        register.set_cell(row, col, info.clone());
        report.sorting_info = Some(info);
        report.register_dirty = true;
    }

    if let Some((name_col, address_col)) = profile.buyer_columns() {
        limiter::perturb_over_cap(
            data,
            name_col,
            address_col,
            profile.declared_value,
            profile.order_number,
            run.buyer_cap,
        );
    }

    if let (Some(net_col), Some(side_col)) = (profile.net_weight, profile.proration) {
        proration::prorate_side_column(data, net_col, side_col, record.billable_weight)?;
    }
    Ok(())
}

fn run_beg(
    run: &StationRun<'_>,
    data: &mut Dataset,
    report: &mut ManifestReport,
) -> Result<(), EngineError> {
    let profile = &run.profile;
    report.trimmed_trailing_row = tidy::trim_trailing_row(data, profile.trailing_probe);
    limiter::shrink_over_cap(
        data,
        profile.order_number,
        profile.declared_value,
        run.shrink_cap,
    )
}

fn run_otp(
    run: &StationRun<'_>,
    data: &mut Dataset,
    record: &WaybillRecord,
    report: &mut ManifestReport,
) -> Result<(), EngineError> {
    let profile = &run.profile;
    report.trimmed_trailing_row = tidy::trim_trailing_row(data, profile.trailing_probe);

    if let Some((name_col, address_col)) = profile.buyer_columns() {
        identity::synthesize(data, profile.order_number, name_col, address_col);
    }

    classify_stage(run, data, report)?;

    if let Some((name_col, address_col)) = profile.buyer_columns() {
        limiter::perturb_over_cap(
            data,
            name_col,
            address_col,
            profile.declared_value,
            profile.order_number,
            run.buyer_cap,
        );
    }

    if let (Some(city_col), Some(postcode_col)) = (profile.origin_city, profile.origin_postcode) {
        tidy::fill_origin(data, city_col, postcode_col);
    }

    if let Some(net_col) = profile.net_weight {
        proration::prorate_in_place(data, net_col, record.billable_weight)?;
        if let Some(package_col) = profile.package_number {
            report.package_view = Some(proration::package_rollup(
                data,
                package_col,
                net_col,
                profile.declared_value,
            ));
        }
    }
    Ok(())
}

fn classify_stage(
    run: &StationRun<'_>,
    data: &mut Dataset,
    report: &mut ManifestReport,
) -> Result<(), EngineError> {
    if let Some((code_col, description_col)) = run.profile.classifier_columns() {
        let outcome = classifier::classify(data, run.catalog, code_col, description_col);
        report.unmatched_rows = outcome.unmatched_rows.len();
        report.fallback_applied = outcome.fallback_applied;
        if outcome.needs_review() {
            return Err(EngineError::ClassificationReview {
                unmatched: outcome.unmatched_rows.len(),
                limit: UNMATCHED_LIMIT,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::NO_MATCH;

    fn compact_lgg_profile() -> ColumnProfile {
        ColumnProfile {
            order_number: 1,
            declared_value: 2,
            trailing_probe: 2,
            buyer_name: Some(3),
            buyer_address: Some(4),
            net_weight: Some(5),
            proration: Some(6),
            hs_code: Some(7),
            description: Some(8),
            box_number: Some(9),
            routing: Some(10),
            consignee_id: None,
            unlocode: None,
            origin_city: None,
            origin_postcode: None,
            sequence: None,
            package_number: None,
            admin_column: None,
            admin_header: None,
        }
    }

    fn wide_row(cells: Vec<&str>, width: usize) -> Vec<String> {
        let mut row: Vec<String> = cells.into_iter().map(String::from).collect();
        row.resize(width, String::new());
        row
    }

    fn catalog_with_mug() -> Catalog {
        Catalog::from_rows(&[
            vec!["Name".to_string(), "C10".to_string(), "C6".to_string()],
            vec![
                "Ceramic Mug".to_string(),
                "6912002100".to_string(),
                "691200".to_string(),
            ],
        ])
    }

    fn record(route: &str, billable: f64) -> WaybillRecord {
        WaybillRecord {
            awb: "999-12345675".to_string(),
            flight_number: "QY8321".to_string(),
            departure_port: "HKG".to_string(),
            arrival_station: "SOB".to_string(),
            etd_serial: "45000".to_string(),
            eta_serial: "45000.5".to_string(),
            boxes: "2".to_string(),
            route_code: route.to_string(),
            parcels: "3".to_string(),
            billable_weight: billable,
            download_url: String::new(),
            airtable_code: "HU BUD TEMU".to_string(),
            sorting_info: String::new(),
            register_row: 2,
        }
    }

    fn empty_register() -> Dataset {
        let mut register = Dataset::from_rows("awb list", vec![vec!["awb".to_string()]]);
        register.set_cell(2, 1, "999-12345675");
        register
    }

    #[test]
    fn lgg_family_runs_every_stage_in_order() {
        let catalog = catalog_with_mug();
        let run = StationRun {
            station: Station::Sob,
            profile: compact_lgg_profile(),
            catalog: &catalog,
            buyer_cap: 150.0,
            shrink_cap: 0.0,
        };
        let rows = vec![
            wide_row(
                vec!["Ord", "Val", "Name", "Addr", "Net", "Chg", "HS", "Desc", "Box", "Route"],
                10,
            ),
            wide_row(
                vec!["76%1", "60", "Ann kft", "5 High St", "2", "", "0000", "ceramic mug", "ATFA0001"],
                10,
            ),
            wide_row(
                vec!["7602", "70", "", "", "3", "", "8504409090", "adapter", "WVAT0002"],
                10,
            ),
            wide_row(vec![], 10),
        ];
        let mut data = Dataset::from_rows("Sheet1", rows);
        let mut register = empty_register();
        let record = record(router::ROUTE_MIX_SOB, 10.0);

        let report = run_station(&run, &mut data, &mut register, &record).unwrap();

        assert!(report.trimmed_trailing_row);
        assert_eq!(report.data_rows, 2);
        // Classifier adopted the catalog code; the "8" code was accepted.
        assert_eq!(data.cell(2, 7), "6912002100");
        assert_eq!(data.cell(3, 7), "8504409090");
        // Scrub ran before identity synthesis.
        assert_eq!(data.cell(2, 1), "761");
        assert_eq!(data.cell(2, 3), "Ann");
        // Blank identity replaced with an opaque pair.
        assert!(!data.cell(3, 3).is_empty());
        assert!(!data.cell(3, 4).is_empty());
        // Router stamped codes and wrote the tally to the register.
        assert_eq!(data.cell(2, 10), "AT Post Kalsdorf TEMU");
        assert_eq!(data.cell(3, 10), "AT Post Vienna TEMU");
        let tally = report.sorting_info.as_deref().unwrap();
        assert_eq!(
            tally,
            "\"Allhaming\": 0, \"Hagenbrunn\": 0, \"Karlsdorf\": 1, \"Wien\": 1"
        );
        assert_eq!(register.cell(2, 21), tally);
        assert!(report.register_dirty);
        // Both buyers stay under the cap, so the names survive.
        assert_eq!(data.cell(2, 3), "Ann");
        // Side-column proration from billable 10 over weights 2 and 3.
        assert_eq!(data.cell(2, 6), "3.6");
        assert_eq!(data.cell(3, 6), "5.4");
    }

    #[test]
    fn classification_escalation_stops_the_pipeline() {
        let catalog = catalog_with_mug();
        let run = StationRun {
            station: Station::Lgg,
            profile: compact_lgg_profile(),
            catalog: &catalog,
            buyer_cap: 150.0,
            shrink_cap: 0.0,
        };
        let mut rows = vec![wide_row(
            vec!["Ord", "Val", "Name", "Addr", "Net", "Chg", "HS", "Desc", "Box", "Route"],
            10,
        )];
        for i in 0..6 {
            let order = format!("O{i}");
            let desc = format!("qq{i}");
            rows.push(wide_row(
                vec![order.as_str(), "10", "n", "1 a", "1", "", "1", desc.as_str()],
                10,
            ));
        }
        let mut data = Dataset::from_rows("Sheet1", rows);
        let mut register = empty_register();
        let record = record("", 10.0);

        let err = run_station(&run, &mut data, &mut register, &record).unwrap_err();
        assert!(matches!(
            err,
            EngineError::ClassificationReview {
                unmatched: 6,
                limit: UNMATCHED_LIMIT
            }
        ));
        // Sentinels persisted; the later stages never ran.
        for row in 2..=7 {
            assert_eq!(data.cell(row, 7), NO_MATCH);
            assert_eq!(data.cell(row, 6), "");
        }
    }

    #[test]
    fn beg_pipeline_shrinks_orders_over_cap() {
        let catalog = Catalog::from_rows(&[]);
        let run = StationRun {
            station: Station::Beg,
            profile: ColumnProfile::beg(),
            catalog: &catalog,
            buyer_cap: 150.0,
            shrink_cap: 150.0,
        };
        let mut rows = vec![wide_row(vec![], 17)];
        let mut first = wide_row(vec![], 17);
        first[1] = "ORD1".to_string();
        first[16] = "100".to_string();
        rows.push(first.clone());
        rows.push(first);
        let mut data = Dataset::from_rows("Sheet1", rows);
        let mut register = empty_register();
        let record = record("", 0.0);

        let report = run_station(&run, &mut data, &mut register, &record).unwrap();
        assert_eq!(data.cell(2, 17), "75");
        assert_eq!(data.cell(3, 17), "75");
        assert_eq!(report.data_rows, 2);
        assert!(report.package_view.is_none());
    }

    #[test]
    fn otp_pipeline_prorates_in_place_and_derives_package_view() {
        let catalog = catalog_with_mug();
        let profile = ColumnProfile {
            order_number: 1,
            declared_value: 7,
            trailing_probe: 7,
            buyer_name: Some(2),
            buyer_address: Some(3),
            net_weight: Some(6),
            proration: None,
            hs_code: Some(4),
            description: Some(5),
            box_number: None,
            routing: None,
            consignee_id: None,
            unlocode: None,
            origin_city: Some(8),
            origin_postcode: Some(9),
            sequence: None,
            package_number: Some(1),
            admin_column: None,
            admin_header: None,
        };
        let run = StationRun {
            station: Station::Otp,
            profile,
            catalog: &catalog,
            buyer_cap: 150.0,
            shrink_cap: 0.0,
        };
        let rows = vec![
            wide_row(vec!["Pkg", "Name", "Addr", "HS", "Desc", "Net", "Val", "City", "Post"], 9),
            wide_row(vec!["P1", "Bob", "9 Elm", "8504", "thing", "2", "30", "", ""], 9),
            wide_row(vec!["P1", "Bob", "9 Elm", "8504", "thing", "2", "30", "", ""], 9),
            wide_row(vec!["P2", "Cara", "1 Oak", "8504", "gizmo", "4", "50", "x", "y"], 9),
        ];
        let mut data = Dataset::from_rows("Sheet1", rows);
        let mut register = empty_register();
        let record = record("", 9.0);

        let report = run_station(&run, &mut data, &mut register, &record).unwrap();

        // Coefficient (9 - 1) / 8 = 1, so weights keep their magnitude at
        // three decimals.
        assert_eq!(data.cell(2, 6), "2.000");
        assert_eq!(data.cell(4, 6), "4.000");
        // Empty origin filled with the defaults, swapped layout honored.
        assert_eq!(data.cell(2, 8), "zhaoqing");
        assert_eq!(data.cell(2, 9), "526200");
        assert_eq!(data.cell(4, 8), "x");

        let package = report.package_view.unwrap();
        assert_eq!(package.name(), "package");
        assert_eq!(package.cell(2, 6), "4");
        assert_eq!(package.cell(2, 7), "60");
        assert_eq!(package.cell(4, 6), "4");
        assert_eq!(package.cell(4, 7), "50");
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let catalog = Catalog::from_rows(&[]);
        let run = StationRun {
            station: Station::Lgg,
            profile: ColumnProfile::lgg(),
            catalog: &catalog,
            buyer_cap: 150.0,
            shrink_cap: 0.0,
        };
        let mut data = Dataset::from_rows("Sheet1", vec![vec!["h".to_string()]]);
        let mut register = empty_register();
        let record = record("", 10.0);
        let err = run_station(&run, &mut data, &mut register, &record).unwrap_err();
        assert!(matches!(err, EngineError::EmptyManifest));
    }

    #[test]
    fn station_codes_parse_case_insensitively() {
        assert_eq!("lgg".parse::<Station>().unwrap(), Station::Lgg);
        assert_eq!("OTP".parse::<Station>().unwrap(), Station::Otp);
        assert_eq!(Station::Ath.code(), "ATH");
        let err = "CDG".parse::<Station>().unwrap_err();
        assert!(matches!(err, EngineError::UnknownStation { .. }));
    }

    #[test]
    fn ath_and_sob_share_the_lgg_layout() {
        assert_eq!(Station::Ath.default_profile().order_number, 29);
        assert_eq!(Station::Sob.default_profile().order_number, 29);
        assert_eq!(Station::Beg.default_profile().order_number, 2);
    }
}
