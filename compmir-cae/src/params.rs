//! Feature extraction parameters
//!
//! Loaded from a flat TOML file:
//!
//! ```toml
//! n_bins = 120
//! length_ngram = 32
//! n_bases = 256
//! dropout = 0.5
//! sr = 44100
//! bins_per_oct = 24
//! fmin = 50
//! hop_length = 1984
//! ```
//!
//! Unrelated keys (training settings and the like) are ignored.

use crate::error::ConfigError;
use serde::Serialize;
use std::path::Path;
use toml::{Table, Value};
use tracing::debug;

/// Keys every configuration must define, in validation order
pub const REQUIRED_KEYS: [&str; 8] = [
    "n_bins",
    "length_ngram",
    "n_bases",
    "dropout",
    "sr",
    "bins_per_oct",
    "fmin",
    "hop_length",
];

/// Validated extractor parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureParameters {
    /// Frequency bins per frame
    pub n_bins: usize,
    /// Frames per window
    pub length_ngram: usize,
    /// Number of complex bases (output features per window)
    pub n_bases: usize,
    /// Training dropout; unused at inference
    pub dropout: f64,
    /// Sample rate the audio is analysed at
    pub sr: u32,
    pub bins_per_oct: usize,
    /// Frequency of the lowest bin in Hz
    pub fmin: f64,
    pub hop_length: usize,
}

impl FeatureParameters {
    /// Load and validate parameters from a TOML file
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading feature extraction configuration");
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate parameters from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let table: Table = contents
            .parse()
            .map_err(|e: toml::de::Error| ConfigError::Parse(e.to_string()))?;
        Self::from_table(&table)
    }

    /// Validate a parsed table
    ///
    /// Presence of all keys is checked before any type, so a file missing
    /// several keys reports the first missing one.
    pub fn from_table(table: &Table) -> Result<Self, ConfigError> {
        if let Some(missing) = REQUIRED_KEYS.iter().find(|key| !table.contains_key(**key)) {
            return Err(ConfigError::MissingKey(missing.to_string()));
        }

        let params = Self {
            n_bins: positive_integer(table, "n_bins")?,
            length_ngram: positive_integer(table, "length_ngram")?,
            n_bases: positive_integer(table, "n_bases")?,
            dropout: dropout(table)?,
            sr: u32::try_from(positive_integer(table, "sr")?).map_err(|_| {
                ConfigError::InvalidValue {
                    key: "sr".to_string(),
                    reason: "sample rate out of range".to_string(),
                }
            })?,
            bins_per_oct: positive_integer(table, "bins_per_oct")?,
            fmin: fmin(table)?,
            hop_length: positive_integer(table, "hop_length")?,
        };

        debug!(params = ?params, "Validated feature extraction configuration");
        Ok(params)
    }

    /// Flattened window length, the model's input size
    pub fn input_size(&self) -> usize {
        self.n_bins * self.length_ngram
    }
}

fn positive_integer(table: &Table, key: &str) -> Result<usize, ConfigError> {
    let value = match table.get(key) {
        Some(Value::Integer(v)) => *v,
        Some(_) => {
            return Err(ConfigError::WrongType {
                key: key.to_string(),
                expected: "an integer",
            })
        }
        None => return Err(ConfigError::MissingKey(key.to_string())),
    };

    usize::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("must be a positive integer, got {}", value),
        })
}

fn dropout(table: &Table) -> Result<f64, ConfigError> {
    let value = match table.get("dropout") {
        Some(Value::Float(v)) => *v,
        Some(_) => {
            return Err(ConfigError::WrongType {
                key: "dropout".to_string(),
                expected: "a float",
            })
        }
        None => return Err(ConfigError::MissingKey("dropout".to_string())),
    };

    if (0.0..1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key: "dropout".to_string(),
            reason: format!("must be in [0, 1), got {}", value),
        })
    }
}

fn fmin(table: &Table) -> Result<f64, ConfigError> {
    let value = match table.get("fmin") {
        Some(Value::Float(v)) => *v,
        Some(Value::Integer(v)) => *v as f64,
        Some(_) => {
            return Err(ConfigError::WrongType {
                key: "fmin".to_string(),
                expected: "a float or an integer",
            })
        }
        None => return Err(ConfigError::MissingKey("fmin".to_string())),
    };

    if value > 0.0 && value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key: "fmin".to_string(),
            reason: format!("must be a positive frequency, got {}", value),
        })
    }
}
