//! Handler forecast workbook.
//!
//! Liège shipments go out with a one-line forecast for the ground
//! handler: a fixed header row plus the flight line derived from the
//! waybill record. Saved as `{awb}_handler_forecast.xlsx` next to the
//! manifest and attached to the Liège pre-alert.

use std::path::{Path, PathBuf};

use prefile_engine::numeric::{format_number, parse_decimal};
use prefile_engine::WaybillRecord;
use prefile_grid::Dataset;

use crate::CliError;

const HANDLER: &str = "HSH";
const WAREHOUSE_CODE: &str = "BECUGHE000048";

const HEADERS: [&str; 17] = [
    "Mode",
    "Client",
    "Service",
    "MAWB",
    "HAWB",
    "Reference",
    "Flight",
    "Destination",
    "ETD",
    "ETA",
    "Boxes",
    "Parcels",
    "Chargeable Weight",
    "Delivery Channel",
    "Handler",
    "Warehouse Code",
    "Customs Code",
];

/// Build the single-line forecast sheet for a waybill.
pub(crate) fn build(record: &WaybillRecord) -> Dataset {
    let line = vec![
        "Airfreight".to_string(),
        "YDH".to_string(),
        "B2C".to_string(),
        record.awb.clone(),
        record.awb.clone(),
        String::new(),
        record.flight_number.clone(),
        record.arrival_station.clone(),
        record.etd_text(),
        record.eta_text(),
        format_number(parse_decimal(&record.boxes)),
        format_number(parse_decimal(&record.parcels)),
        format_number(record.billable_weight),
        record.airtable_code.clone(),
        HANDLER.to_string(),
        WAREHOUSE_CODE.to_string(),
        WAREHOUSE_CODE.to_string(),
    ];
    let headers = HEADERS.iter().map(|h| h.to_string()).collect();
    Dataset::from_rows("Sheet1", vec![headers, line])
}

/// Forecast workbook path for a waybill, next to the manifest.
pub(crate) fn workbook_path(dir: &Path, awb: &str) -> PathBuf {
    dir.join(format!("{awb}_handler_forecast.xlsx"))
}

/// Build and save the forecast workbook. Returns the written path.
pub(crate) fn write(record: &WaybillRecord, dir: &Path) -> Result<PathBuf, CliError> {
    let sheet = build(record);
    let path = workbook_path(dir, &record.awb);
    prefile_io::store::save_sheet(&path, &sheet).map_err(CliError::data)?;
    Ok(path)
}
