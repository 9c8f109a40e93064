//! Startup configuration for the revisioning core.
//!
//! # Responsibility
//! - Load the JSON config that drives the key policy hook and log level.
//!
//! # Invariants
//! - Unknown fields are rejected rather than ignored.
//! - Loading a config has no effect until `build_policy` is called.

use crate::logging::normalize_level;
use crate::policy::key_policy::KeyPolicy;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Config load error.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    InvalidLogLevel(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config: {err}"),
            Self::InvalidLogLevel(message) => write!(f, "{message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidLogLevel(_) => None,
        }
    }
}

/// Exclusion policy overrides applied through the key policy hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// Start from an empty set instead of the defaults.
    pub replace_defaults: bool,
    /// Keys added to the exclusion set.
    pub exclude: Vec<String>,
    /// Keys removed from the exclusion set, applied last.
    pub include: Vec<String>,
}

impl PolicyConfig {
    pub fn build_policy(&self) -> KeyPolicy {
        KeyPolicy::with_hook(|mut keys| {
            if self.replace_defaults {
                keys.clear();
            }
            keys.extend(self.exclude.iter().cloned());
            for key in &self.include {
                keys.remove(key);
            }
            keys
        })
    }
}

/// Top-level config file shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetarevConfig {
    pub policy: PolicyConfig,
    /// One of `trace|debug|info|warn|error`; `None` uses the build default.
    pub log_level: Option<String>,
}

impl MetarevConfig {
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(source).map_err(ConfigError::Parse)?;
        if let Some(level) = config.log_level.as_deref() {
            normalize_level(level).map_err(ConfigError::InvalidLogLevel)?;
        }
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json_str(&source)
    }

    pub fn build_policy(&self) -> KeyPolicy {
        self.policy.build_policy()
    }
}
