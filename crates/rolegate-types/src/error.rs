//! Error hierarchy for rolegate.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all rolegate operations.
#[derive(Debug, Error)]
pub enum RolegateError {
    #[error("Matrix error: {0}")]
    Matrix(#[from] MatrixError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from mutating or (de)serializing a permission matrix.
///
/// Queries never fail; only mutations addressed at a status the matrix
/// does not know about are rejected.
#[derive(Debug, Error)]
pub enum MatrixError {
    #[error("Unknown status: {status}")]
    UnknownStatus { status: String },

    #[error("Snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Errors from loading a matrix definition file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}
