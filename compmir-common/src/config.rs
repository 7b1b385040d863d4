//! Configuration loading and credential resolution
//!
//! Configuration file priority:
//! 1. Command-line argument (highest priority)
//! 2. `COMPMIR_CONFIG` environment variable
//! 3. `{config_dir}/compmir/config.toml` (OS-dependent)
//!
//! A missing configuration file is not an error: defaults are used.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit configuration file
pub const CONFIG_ENV_VAR: &str = "COMPMIR_CONFIG";

/// Environment variable carrying the Dunya API token
pub const TOKEN_ENV_VAR: &str = "DUNYA_TOKEN";

/// Workspace configuration read from TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Dunya personal access token
    #[serde(default)]
    pub dunya_token: Option<String>,

    /// Default tradition for corpora commands ("carnatic" or "hindustani")
    #[serde(default)]
    pub tradition: Option<String>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Locate the configuration file to read
///
/// Returns `None` only when no explicit path was given and the platform has
/// no configuration directory.
pub fn config_file_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: OS-dependent default
    dirs::config_dir().map(|d| d.join("compmir").join("config.toml"))
}

/// Load the TOML configuration at `path`
///
/// A missing file yields `TomlConfig::default()` with a warning; a file that
/// exists but does not parse is a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config: TomlConfig = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))?;

    info!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Resolve the Dunya token from 3-tier configuration
///
/// **Priority:** CLI → ENV → TOML
pub fn resolve_dunya_token(cli_arg: Option<&str>, toml_config: &TomlConfig) -> Result<String> {
    let env_token = std::env::var(TOKEN_ENV_VAR).ok();

    let candidates = [
        ("command line", cli_arg.map(str::to_string)),
        ("environment", env_token),
        ("TOML", toml_config.dunya_token.clone()),
    ];

    let valid: Vec<(&str, String)> = candidates
        .into_iter()
        .filter_map(|(source, token)| token.filter(|t| is_valid_token(t)).map(|t| (source, t)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(s, _)| *s).collect();
        warn!(
            "Dunya token found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match valid.into_iter().next() {
        Some((source, token)) => {
            info!("Dunya token loaded from {}", source);
            Ok(token.trim().to_string())
        }
        None => Err(Error::Config(format!(
            "Dunya token not configured. Please configure using one of:\n\
             1. Command line: --token your-token\n\
             2. Environment: {}=your-token\n\
             3. TOML config: ~/.config/compmir/config.toml (dunya_token = \"your-token\")\n\
             \n\
             Obtain a token from your Dunya user profile",
            TOKEN_ENV_VAR
        ))),
    }
}

/// Validate token (non-empty, non-whitespace)
pub fn is_valid_token(token: &str) -> bool {
    !token.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_token() {
        assert!(is_valid_token("abc123"));
        assert!(!is_valid_token(""));
        assert!(!is_valid_token("   \t"));
    }

    #[test]
    fn test_logging_defaults_to_info() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(config.dunya_token.is_none());
    }

    #[test]
    fn test_cli_path_wins() {
        let path = config_file_path(Some(Path::new("/tmp/custom.toml")));
        assert_eq!(path, Some(PathBuf::from("/tmp/custom.toml")));
    }
}
