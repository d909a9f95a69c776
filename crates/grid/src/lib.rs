pub mod dataset;
pub mod key;
pub mod label;

pub use dataset::Dataset;
pub use key::{BuyerKey, OrderKey, PackageKey};
pub use label::{column_label, parse_column_label};
