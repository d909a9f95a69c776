//! Customs manifest transformation engine.
//!
//! Everything in this crate is pure: functions take a loaded
//! [`Dataset`](prefile_grid::Dataset) plus read-only reference data
//! (catalog, waybill record) and mutate selected columns in place.
//! File I/O, network fetches, and mail live with the caller.

pub mod catalog;
pub mod classifier;
pub mod columns;
pub mod error;
pub mod identity;
pub mod limiter;
pub mod numeric;
pub mod pipeline;
pub mod proration;
pub mod router;
pub mod tidy;
pub mod waybill;

pub use catalog::{Catalog, CatalogEntry};
pub use columns::ColumnProfile;
pub use error::EngineError;
pub use pipeline::{run_station, ManifestReport, Station, StationRun};
pub use waybill::WaybillRecord;
