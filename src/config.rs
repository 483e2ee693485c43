//! Guard configuration
//!
//! Loaded from a JSON file. Every field has a default, so `{}` is a valid
//! configuration that guards all seven query operations on `_id`-keyed
//! models.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::explain::DEFAULT_EXPLAIN_PREFIX;
use crate::query::QueryOperation;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Plan guard configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Whether queries are checked at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Primary-key field used by the short-circuit rule (default: `_id`)
    #[serde(default = "default_primary_key")]
    pub primary_key: String,

    /// Prefix of derived explain model names (default: `explain_`)
    #[serde(default = "default_explain_model_prefix")]
    pub explain_model_prefix: String,

    /// Operations that are checked (default: all guarded operations)
    #[serde(default = "default_operations")]
    pub operations: Vec<QueryOperation>,
}

fn default_enabled() -> bool {
    true
}
fn default_primary_key() -> String {
    "_id".to_string()
}
fn default_explain_model_prefix() -> String {
    DEFAULT_EXPLAIN_PREFIX.to_string()
}
fn default_operations() -> Vec<QueryOperation> {
    QueryOperation::ALL.to_vec()
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            primary_key: default_primary_key(),
            explain_model_prefix: default_explain_model_prefix(),
            operations: default_operations(),
        }
    }
}

impl GuardConfig {
    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: GuardConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration with checking turned off
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::default()
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.primary_key.is_empty() {
            return Err(ConfigError::Invalid("primary_key must not be empty".into()));
        }

        if self.explain_model_prefix.is_empty() {
            return Err(ConfigError::Invalid(
                "explain_model_prefix must not be empty".into(),
            ));
        }

        if self.operations.is_empty() {
            return Err(ConfigError::Invalid(
                "operations must list at least one operation".into(),
            ));
        }

        Ok(())
    }

    /// Whether `operation` is checked under this configuration
    pub fn guards(&self, operation: QueryOperation) -> bool {
        self.enabled && self.operations.contains(&operation)
    }
}
