//! Error types for mapping and writing leaves.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum LeafError {
    /// Malformed input document (JSON or XML). Only that document is lost.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Malformed override or substitution entries
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input or configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// I/O failure in a downstream writer
    #[error("Write error: {0}")]
    Write(#[from] std::io::Error),

    /// YAML configuration file could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Leaf serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LeafError {
    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        LeafError::Config(message.into())
    }

    /// Create a Read error for `path`
    pub fn read(path: &std::path::Path, source: std::io::Error) -> Self {
        LeafError::Read {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create a Parse error
    pub fn parse(message: impl std::fmt::Display) -> Self {
        LeafError::Parse(message.to_string())
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, LeafError>;
