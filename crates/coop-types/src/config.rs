//! Configuration for a wallet ledger instance.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{CoopError, Currency, ErrorCode, Result, constants};

/// Top-level configuration. Every field has a default, so an empty JSON
/// object is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoopConfig {
    /// Tenant identifier stamped on every record.
    pub coop: String,
    /// Currency new wallets are denominated in.
    pub currency: Currency,
    /// Length of generated deposit reference codes.
    pub reference_code_length: usize,
    pub log: LogConfig,
}

impl Default for CoopConfig {
    fn default() -> Self {
        Self {
            coop: constants::DEFAULT_COOP.to_string(),
            currency: Currency::default(),
            reference_code_length: constants::DEFAULT_REFERENCE_CODE_LENGTH,
            log: LogConfig::default(),
        }
    }
}

impl CoopConfig {
    /// Default config for the given coop.
    pub fn for_coop(coop: impl Into<String>) -> Self {
        Self {
            coop: coop.into(),
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Reject values the managers cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.coop.trim().is_empty() {
            return Err(CoopError::internal(ErrorCode::IntConfig, "coop must not be empty"));
        }
        let range = constants::MIN_REFERENCE_CODE_LENGTH..=constants::MAX_REFERENCE_CODE_LENGTH;
        if !range.contains(&self.reference_code_length) {
            return Err(CoopError::internal(
                ErrorCode::IntConfig,
                format!(
                    "reference_code_length {} outside {}..={}",
                    self.reference_code_length,
                    constants::MIN_REFERENCE_CODE_LENGTH,
                    constants::MAX_REFERENCE_CODE_LENGTH,
                ),
            ));
        }
        Ok(())
    }
}

/// Logging output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` env-filter directive, overridden by `RUST_LOG` when set.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: constants::DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}
