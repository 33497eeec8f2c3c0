//! Error types for Vigil configuration and registry construction.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("duplicate endpoint name: {0}")]
    DuplicateEndpoint(String),

    #[error("invalid url for endpoint {name}: {url}")]
    InvalidUrl { name: String, url: String },

    #[error("invalid duration for {field}: {value}")]
    InvalidDuration { field: &'static str, value: String },
}
