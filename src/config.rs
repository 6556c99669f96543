//! Configuration module for the output governor
//!
//! Configuration is supplied by the embedding service as JSON bytes.
//! Every field has a default, so an empty object is a valid configuration.

use serde::Deserialize;
use thiserror::Error;

/// Governor configuration
#[derive(Clone, Debug, Deserialize)]
pub struct GovernorConfig {
    /// Rolling window capacity in characters. Must cover the longest
    /// pattern the classifier needs to see in one piece.
    #[serde(default = "default_window_capacity")]
    pub window_capacity: usize,

    /// Characters accumulated between throttled evaluations
    #[serde(default = "default_eval_threshold")]
    pub eval_threshold: usize,

    /// PII kinds to detect
    #[serde(default = "default_pii_types")]
    pub pii_types: Vec<String>,

    /// What a non-streaming `redact` verdict does to the response
    #[serde(default)]
    pub redact_mode: RedactMode,

    /// Emit an event for every mid-stream redaction, not only the summary
    #[serde(default = "default_audit_each_redaction")]
    pub audit_each_redaction: bool,

    /// Whether to log verdict reasons at info level
    #[serde(default = "default_log_matches")]
    pub log_matches: bool,
}

/// Handling of `redact` verdicts on complete responses
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedactMode {
    /// Release the response unmodified; the event still records `redact`
    #[default]
    Permissive,
    /// Replace every match with its placeholder before release
    Mask,
}

fn default_window_capacity() -> usize {
    300
}

fn default_eval_threshold() -> usize {
    50
}

fn default_pii_types() -> Vec<String> {
    vec!["email".to_string(), "phone".to_string()]
}

fn default_audit_each_redaction() -> bool {
    true
}

fn default_log_matches() -> bool {
    true
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            window_capacity: default_window_capacity(),
            eval_threshold: default_eval_threshold(),
            pii_types: default_pii_types(),
            redact_mode: RedactMode::default(),
            audit_each_redaction: default_audit_each_redaction(),
            log_matches: default_log_matches(),
        }
    }
}

impl GovernorConfig {
    /// Parse and validate configuration from JSON bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        let config_str =
            std::str::from_utf8(bytes).map_err(|e| ConfigError::InvalidUtf8(e.to_string()))?;

        let config: Self = serde_json::from_str(config_str)
            .map_err(|e| ConfigError::InvalidJson(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the governor cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid(
                "window_capacity must be greater than zero".to_string(),
            ));
        }
        if self.eval_threshold == 0 {
            return Err(ConfigError::Invalid(
                "eval_threshold must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration parsing errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid UTF-8: {0}")]
    InvalidUtf8(String),
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),
    #[error("Unknown PII type: {0}")]
    UnknownPiiType(String),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
