use std::fmt;

#[derive(Debug)]
pub enum EngineError {
    /// Manifest has no data rows beneath the header.
    EmptyManifest,
    /// More rows failed classification than the review limit allows.
    /// The manifest stays partially classified for manual matching.
    ClassificationReview { unmatched: usize, limit: usize },
    /// No waybill register row carries the requested AWB.
    WaybillNotFound { awb: String },
    /// A register row is too short to carry the expected fields.
    RegisterRow { row: usize, detail: String },
    /// Net weights sum to zero, so billable weight cannot be prorated.
    ZeroNetWeight,
    /// The proportional-shrink cap is not a positive amount.
    InvalidCap { cap: f64 },
    /// The register's arrival station has no pipeline.
    UnknownStation { code: String },
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyManifest => write!(f, "manifest has no data rows"),
            Self::ClassificationReview { unmatched, limit } => {
                write!(
                    f,
                    "{unmatched} rows left unclassified (limit {limit}); manual review required"
                )
            }
            Self::WaybillNotFound { awb } => {
                write!(f, "waybill '{awb}' not found in any register")
            }
            Self::RegisterRow { row, detail } => {
                write!(f, "register row {row}: {detail}")
            }
            Self::ZeroNetWeight => {
                write!(f, "net weights sum to zero; cannot prorate billable weight")
            }
            Self::InvalidCap { cap } => write!(f, "value cap must be positive, got {cap}"),
            Self::UnknownStation { code } => {
                write!(f, "no pipeline for arrival station '{code}'")
            }
        }
    }
}

impl std::error::Error for EngineError {}
