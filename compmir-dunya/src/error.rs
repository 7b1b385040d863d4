//! Error types for compmir-dunya

use std::path::PathBuf;
use thiserror::Error;

/// Result type for Dunya operations
pub type Result<T> = std::result::Result<T, DunyaError>;

/// Dunya client errors
#[derive(Debug, Error)]
pub enum DunyaError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Server rejected the token (401/403)
    #[error("Unauthorized: Dunya rejected the access token")]
    Unauthorized,

    #[error("API error {0}: {1}")]
    Api(u16, String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Missing field '{field}' in {context}")]
    MissingField { context: String, field: String },

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("No writing method available for data type: {thetype} and {subtype}")]
    UnsupportedArtifactType { thetype: String, subtype: String },

    #[error("Output directory {} doesn't exist; can't save", .0.display())]
    MissingOutputDirectory(PathBuf),

    #[error("Metadata not loaded: run get_metadata() first")]
    MetadataNotLoaded,

    /// Collection-wide metadata load failed
    #[error("{message}")]
    Metadata {
        message: String,
        #[source]
        source: Box<DunyaError>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DunyaError {
    pub(crate) fn missing_field(context: impl Into<String>, field: impl Into<String>) -> Self {
        DunyaError::MissingField {
            context: context.into(),
            field: field.into(),
        }
    }

    /// Whether the failure only concerns the item being fetched
    ///
    /// Item-local failures are skipped by bulk operations; everything else
    /// (rejected credentials, local I/O) aborts them.
    pub fn is_item_local(&self) -> bool {
        matches!(
            self,
            DunyaError::Network(_)
                | DunyaError::NotFound(_)
                | DunyaError::Api(..)
                | DunyaError::Parse(_)
                | DunyaError::MissingField { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_local_classification() {
        assert!(DunyaError::Network("timeout".into()).is_item_local());
        assert!(DunyaError::NotFound("api/carnatic/recording/x".into()).is_item_local());
        assert!(DunyaError::Api(500, "boom".into()).is_item_local());
        assert!(DunyaError::Parse("missing field `artists`".into()).is_item_local());
        assert!(DunyaError::missing_field("artist", "mbid").is_item_local());

        assert!(!DunyaError::Unauthorized.is_item_local());
        assert!(!DunyaError::Io(std::io::Error::other("disk full")).is_item_local());
    }

    #[test]
    fn test_missing_output_directory_message() {
        let err = DunyaError::MissingOutputDirectory(PathBuf::from("/no/such/dir"));
        assert_eq!(
            err.to_string(),
            "Output directory /no/such/dir doesn't exist; can't save"
        );
    }
}
