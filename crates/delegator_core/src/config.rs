//! Registry options and their validation.
//!
//! # Responsibility
//! - Hold per-host tuning for write policy, private naming and lookup depth.
//! - Parse options from JSON for embedding applications.
//!
//! # Invariants
//! - Options returned from `from_json_str` have passed `validate()`.
//! - Missing JSON fields fall back to `RegistryOptions::default()`.

use crate::model::member::DEFAULT_PRIVATE_PREFIX;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Default bound for nested delegation lookups.
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 32;
const MAX_RESOLUTION_DEPTH_CEILING: usize = 256;

/// How `set_delegations` applies a validated batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritePolicy {
    /// Append to existing registrations.
    #[default]
    Merge,
    /// Drop existing registrations first. Deprecated alternate policy, kept
    /// for hosts written against replace semantics.
    Replace,
}

/// Per-host delegation options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryOptions {
    pub write_policy: WritePolicy,
    /// Names starting with this prefix are never offered for delegation.
    pub private_prefix: String,
    pub max_resolution_depth: usize,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::Merge,
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
            max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
        }
    }
}

impl RegistryOptions {
    /// Parses and validates options from a JSON object.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let options: Self =
            serde_json::from_str(raw).map_err(|err| ConfigError::Parse(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.private_prefix.trim().is_empty() {
            return Err(ConfigError::EmptyPrivatePrefix);
        }
        if self.max_resolution_depth == 0
            || self.max_resolution_depth > MAX_RESOLUTION_DEPTH_CEILING
        {
            return Err(ConfigError::ResolutionDepthOutOfRange(
                self.max_resolution_depth,
            ));
        }
        Ok(())
    }

    pub fn merges(&self) -> bool {
        self.write_policy == WritePolicy::Merge
    }
}

/// Option parse/validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    Parse(String),
    EmptyPrivatePrefix,
    ResolutionDepthOutOfRange(usize),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(message) => write!(f, "invalid registry options: {message}"),
            Self::EmptyPrivatePrefix => write!(f, "private_prefix must not be empty"),
            Self::ResolutionDepthOutOfRange(value) => write!(
                f,
                "max_resolution_depth must be within 1..={MAX_RESOLUTION_DEPTH_CEILING}, got {value}"
            ),
        }
    }
}

impl Error for ConfigError {}
