//! Sandbox configuration
//!
//! Values come from the process environment (after `.env` is loaded by the
//! binaries) and can be overridden by command-line flags.

use crate::error::{Result, SandboxError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const ENV_SEED: &str = "SQL_SANDBOX_SEED";
pub const ENV_LISTEN: &str = "SQL_SANDBOX_LISTEN";
pub const ENV_EXPORT_DIR: &str = "SQL_SANDBOX_EXPORT_DIR";
pub const ENV_DELIMITER: &str = "SQL_SANDBOX_DELIMITER";
pub const ENV_LOG: &str = "SQL_SANDBOX_LOG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SandboxConfig {
    /// Load the movies/genres/ratings dataset when the engine starts
    pub seed: bool,

    /// Address the HTTP backend binds to
    pub listen: String,

    /// Directory CSV exports are written to
    pub export_dir: PathBuf,

    /// Default delimiter for CSV imports
    pub delimiter: char,

    /// Fallback tracing filter when RUST_LOG is not set
    pub log_filter: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            seed: true,
            listen: "127.0.0.1:8080".to_string(),
            export_dir: PathBuf::from("."),
            delimiter: ',',
            log_filter: "info".to_string(),
        }
    }
}

impl SandboxConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup. Missing keys keep
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_SEED) {
            config.seed = parse_bool(ENV_SEED, &value)?;
        }
        if let Some(value) = lookup(ENV_LISTEN) {
            config.listen = value.trim().to_string();
        }
        if let Some(value) = lookup(ENV_EXPORT_DIR) {
            config.export_dir = PathBuf::from(value.trim());
        }
        if let Some(value) = lookup(ENV_DELIMITER) {
            config.delimiter = parse_delimiter(&value)
                .map_err(|e| SandboxError::Config(format!("{}: {}", ENV_DELIMITER, e)))?;
        }
        if let Some(value) = lookup(ENV_LOG) {
            config.log_filter = value.trim().to_string();
        }

        Ok(config)
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(SandboxError::Config(format!(
            "{}: expected a boolean, got {:?}",
            key, other
        ))),
    }
}

/// Parse a delimiter given as a single character or one of the names
/// `tab`, `comma`, `semicolon`, `pipe`.
pub fn parse_delimiter(value: &str) -> std::result::Result<char, String> {
    match value {
        "tab" | "\\t" => return Ok('\t'),
        "comma" => return Ok(','),
        "semicolon" => return Ok(';'),
        "pipe" => return Ok('|'),
        _ => {}
    }

    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c != '\n' && c != '\r' => Ok(c),
        _ => Err(format!("expected a single character, got {:?}", value)),
    }
}
