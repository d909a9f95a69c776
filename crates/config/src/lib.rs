// Settings loading and validation

pub mod error;
pub mod settings;

pub use error::ConfigError;
pub use settings::{Caps, ProfileOverride, Recipients, Settings, Smtp, RATE_URL_DEFAULT};
