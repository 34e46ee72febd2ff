//! Error types for Specshot

use thiserror::Error;

/// Result type alias using the Specshot error
pub type Result<T> = std::result::Result<T, Error>;

/// Specshot error types
///
/// Expected absence (no runs, no baseline, no bundle) is modelled with `Option`
/// or empty collections at the call site and never reaches this enum.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid {kind} name: '{name}'")]
    InvalidName { kind: &'static str, name: String },

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("no runs found for spec '{0}'")]
    NoRuns(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<toml::de::Error> for Error {
    fn from(e: toml::de::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(e: toml::ser::Error) -> Self {
        Error::Config(e.to_string())
    }
}

impl From<tempfile::PersistError> for Error {
    fn from(e: tempfile::PersistError) -> Self {
        Error::Io(e.error)
    }
}
