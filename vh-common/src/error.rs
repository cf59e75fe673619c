//! Common error types for VeriHealth

use thiserror::Error;

/// Common result type for VeriHealth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across VeriHealth services
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// A data file could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Parse(err.to_string())
    }
}
