use std::fmt;

/// Settings failures, surfaced before any manifest work starts.
#[derive(Debug)]
pub enum ConfigError {
    Read { path: String, detail: String },
    Write { path: String, detail: String },
    Parse(String),
    Validation(String),
    MissingSecret { var: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Read { path, detail } => {
                write!(f, "cannot read settings at {path}: {detail}")
            }
            ConfigError::Write { path, detail } => {
                write!(f, "cannot write settings at {path}: {detail}")
            }
            ConfigError::Parse(detail) => write!(f, "settings parse error: {detail}"),
            ConfigError::Validation(detail) => write!(f, "invalid settings: {detail}"),
            ConfigError::MissingSecret { var } => {
                write!(f, "environment variable {var} is not set")
            }
        }
    }
}

impl std::error::Error for ConfigError {}
