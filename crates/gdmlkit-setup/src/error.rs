//! Error types for detector setup construction.

use gdmlkit::GeometryError;
use thiserror::Error;

/// Errors that can occur while configuring or building the setup.
#[derive(Error, Debug)]
pub enum SetupError {
    /// Geometry construction failed.
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Configuration could not be encoded.
    #[error("config encode error: {0}")]
    Encode(#[from] toml::ser::Error),

    /// I/O error reading a configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for setup operations.
pub type Result<T> = std::result::Result<T, SetupError>;
