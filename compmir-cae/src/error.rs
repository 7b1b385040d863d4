//! Error types for compmir-cae

use thiserror::Error;

/// Result type for feature extraction
pub type Result<T> = std::result::Result<T, CaeError>;

/// Invalid or incomplete extractor configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not present in configuration file")]
    MissingKey(String),

    #[error("{key} in configuration file should be {expected}")]
    WrongType { key: String, expected: &'static str },

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(String),
}

/// Feature extraction errors
#[derive(Debug, Error)]
pub enum CaeError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Audio error: {0}")]
    Audio(String),

    #[error("Transform error: {0}")]
    Transform(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
