use chrono::{Duration, NaiveDate, NaiveDateTime};
use prefile_grid::Dataset;

use crate::error::EngineError;
use crate::numeric::parse_decimal;

/// Register sheet layout (1-based columns).
mod col {
    pub const AWB: usize = 1;
    pub const FLIGHT: usize = 2;
    pub const DEPARTURE: usize = 4;
    pub const ARRIVAL: usize = 5;
    pub const ETD: usize = 6;
    pub const ETA: usize = 7;
    pub const BOXES: usize = 8;
    pub const ROUTE: usize = 10;
    pub const PARCELS: usize = 11;
    pub const BILLABLE: usize = 12;
    pub const URL: usize = 13;
    pub const AIRTABLE: usize = 19;
    pub const SORTING_INFO: usize = 21;
}

/// One flight's register line. Read-only input to proration and the
/// limiter threshold; the router writes its tally back through
/// [`WaybillRecord::sorting_info_cell`].
#[derive(Debug, Clone)]
pub struct WaybillRecord {
    pub awb: String,
    pub flight_number: String,
    pub departure_port: String,
    pub arrival_station: String,
    pub etd_serial: String,
    pub eta_serial: String,
    pub boxes: String,
    pub route_code: String,
    pub parcels: String,
    pub billable_weight: f64,
    pub download_url: String,
    pub airtable_code: String,
    pub sorting_info: String,
    /// 1-based row in the register sheet, kept for write-back.
    pub register_row: usize,
}

impl WaybillRecord {
    fn from_register(register: &Dataset, row: usize) -> Result<Self, EngineError> {
        let arrival = register.cell(row, col::ARRIVAL).trim().to_string();
        if arrival.is_empty() {
            return Err(EngineError::RegisterRow {
                row,
                detail: "arrival station is empty".to_string(),
            });
        }
        Ok(WaybillRecord {
            awb: register.cell(row, col::AWB).to_string(),
            flight_number: register.cell(row, col::FLIGHT).to_string(),
            departure_port: register.cell(row, col::DEPARTURE).to_string(),
            arrival_station: arrival,
            etd_serial: register.cell(row, col::ETD).to_string(),
            eta_serial: register.cell(row, col::ETA).to_string(),
            boxes: register.cell(row, col::BOXES).to_string(),
            route_code: register.cell(row, col::ROUTE).to_string(),
            parcels: register.cell(row, col::PARCELS).to_string(),
            billable_weight: parse_decimal(register.cell(row, col::BILLABLE)),
            download_url: register.cell(row, col::URL).to_string(),
            airtable_code: register.cell(row, col::AIRTABLE).to_string(),
            sorting_info: register.cell(row, col::SORTING_INFO).to_string(),
            register_row: row,
        })
    }

    pub fn etd(&self) -> Option<NaiveDateTime> {
        serial_to_datetime(&self.etd_serial)
    }

    pub fn eta(&self) -> Option<NaiveDateTime> {
        serial_to_datetime(&self.eta_serial)
    }

    /// Departure time formatted for sheets and mails, blank when the
    /// serial does not parse.
    pub fn etd_text(&self) -> String {
        serial_to_text(&self.etd_serial)
    }

    /// Arrival time formatted for sheets and mails.
    pub fn eta_text(&self) -> String {
        serial_to_text(&self.eta_serial)
    }

    /// (row, column) of this record's sorting-info cell in the register.
    pub fn sorting_info_cell(&self) -> (usize, usize) {
        (self.register_row, col::SORTING_INFO)
    }
}

/// Linear scan for the first register row whose AWB column matches.
/// Ok(None) when the register does not carry the AWB; the caller decides
/// whether another register remains to probe or the lookup is fatal.
pub fn find_in_register(register: &Dataset, awb: &str) -> Result<Option<WaybillRecord>, EngineError> {
    for row in 2..=register.row_count() {
        if register.cell(row, col::AWB) == awb {
            return WaybillRecord::from_register(register, row).map(Some);
        }
    }
    Ok(None)
}

/// Convert a spreadsheet serial date to a timestamp. Day count is the
/// truncated serial minus one beyond day 59 (the 1900 leap-year
/// artifact); the remainder converts to seconds against that reduced
/// count, so for modern serials the two adjustments cancel.
pub fn serial_to_datetime(serial: &str) -> Option<NaiveDateTime> {
    let serial: f64 = serial.trim().parse().ok()?;
    let mut days = serial.trunc() as i64;
    if days > 59 {
        days -= 1;
    }
    let secs = ((serial - days as f64) * 86_400.0) as i64;
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    epoch
        .checked_add_signed(Duration::days(days))?
        .checked_add_signed(Duration::seconds(secs))
}

/// Timestamp layout used by forecast sheets and pre-alert mails.
pub const TIMESTAMP_LAYOUT: &str = "%Y-%m-%d %H:%M:%S";

/// [`serial_to_datetime`] rendered with [`TIMESTAMP_LAYOUT`], empty for
/// unparseable serials.
pub fn serial_to_text(serial: &str) -> String {
    serial_to_datetime(serial)
        .map(|t| t.format(TIMESTAMP_LAYOUT).to_string())
        .unwrap_or_default()
}
