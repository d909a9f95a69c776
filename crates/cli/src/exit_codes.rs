//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract — scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range | Domain         | Description                                  |
//! |-------|----------------|----------------------------------------------|
//! | 0     | Universal      | Success                                      |
//! | 1     | Universal      | General error (unspecified)                  |
//! | 2     | Universal      | CLI usage error (bad args, empty AWB list)   |
//! | 10-19 | settings       | Settings file unreadable or invalid          |
//! | 20-29 | data           | Manifest/catalog/register load-save, lookup  |
//! | 30-39 | review         | Classification escalation, manifest held     |
//! | 40-49 | network        | Rate fetch, document download                |
//! | 50-59 | mail           | Pre-alert dispatch                           |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above

use prefile_engine::EngineError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// Usage error - bad arguments, nothing to process.
pub const EXIT_USAGE: u8 = 2;

/// Settings file cannot be read, parsed, or validated.
pub const EXIT_CONFIG: u8 = 10;

/// Dataset error - manifest, catalog, or register unreadable or
/// unwritable, waybill missing from every register, or a register row
/// too malformed to process.
pub const EXIT_DATA: u8 = 20;

/// Classification escalation - too many rows left unmatched; the
/// partially classified manifest is saved for manual review.
pub const EXIT_REVIEW: u8 = 30;

/// Network error - exchange-rate fetch or document download failed
/// after retries.
pub const EXIT_NETWORK: u8 = 40;

/// Mail error - the pre-alert could not be built or sent.
pub const EXIT_MAIL: u8 = 50;

/// Map an engine error to its exit code.
pub fn engine_exit_code(err: &EngineError) -> u8 {
    match err {
        EngineError::ClassificationReview { .. } => EXIT_REVIEW,
        EngineError::InvalidCap { .. } => EXIT_CONFIG,
        EngineError::EmptyManifest
        | EngineError::WaybillNotFound { .. }
        | EngineError::RegisterRow { .. }
        | EngineError::ZeroNetWeight
        | EngineError::UnknownStation { .. } => EXIT_DATA,
    }
}
