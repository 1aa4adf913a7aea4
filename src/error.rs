//! Error types for configuration and profile loading
//!
//! Runtime shaping never fails: unready sources, missing profiles and stale
//! bindings all degrade to neutral values. Only reading and validating
//! configuration can produce an error.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or written
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML document could not be parsed or serialized
    #[error("invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A value is out of range or inconsistent with another value
    #[error("invalid configuration: {0}")]
    Invalid(String),

    /// A device-name pattern is not a valid regular expression
    #[error("invalid device pattern '{pattern}': {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

impl ConfigError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Result alias for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;
