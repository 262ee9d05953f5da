//! Engine configuration.
//!
//! All tunables are passed explicitly at construction. [`EngineConfig`]
//! can be built in code or deserialized from TOML; missing keys fall
//! back to the defaults below.
//!
//! ```toml
//! quiet_period_ms = 400
//! min_search_chars = 3
//! min_resolve_chars = 5
//! suggestion_limit = 5
//! provider = "nominatim"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Shortest accepted debounce quiet period.
pub const MIN_QUIET_PERIOD_MS: u64 = 50;
/// Longest accepted debounce quiet period.
pub const MAX_QUIET_PERIOD_MS: u64 = 5_000;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`EngineConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {message}")]
    Invalid {
        /// Description of the offending value.
        message: String,
    },
}

/// Tunables for the address resolution engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Quiet period before a changed input is searched, in milliseconds.
    #[serde(default = "default_quiet_period_ms")]
    pub quiet_period_ms: u64,
    /// Minimum normalized length for type-ahead search.
    #[serde(default = "default_min_search_chars")]
    pub min_search_chars: usize,
    /// Minimum normalized length for submit-time resolution.
    #[serde(default = "default_min_resolve_chars")]
    pub min_resolve_chars: usize,
    /// Maximum number of suggestions requested per query.
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    /// Service id from the geocoder registry.
    #[serde(default = "default_provider")]
    pub provider: String,
}

const fn default_quiet_period_ms() -> u64 {
    500
}

const fn default_min_search_chars() -> usize {
    3
}

const fn default_min_resolve_chars() -> usize {
    5
}

const fn default_suggestion_limit() -> usize {
    5
}

fn default_provider() -> String {
    "nominatim".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quiet_period_ms: default_quiet_period_ms(),
            min_search_chars: default_min_search_chars(),
            min_resolve_chars: default_min_resolve_chars(),
            suggestion_limit: default_suggestion_limit(),
            provider: default_provider(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a TOML config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the TOML is malformed or a value is out
    /// of range.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::de::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is malformed,
    /// or contains out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading engine config from {}", path.display());
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    /// Checks that all values are within their accepted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_QUIET_PERIOD_MS..=MAX_QUIET_PERIOD_MS).contains(&self.quiet_period_ms) {
            return Err(ConfigError::Invalid {
                message: format!(
                    "quiet_period_ms must be between {MIN_QUIET_PERIOD_MS} and \
                     {MAX_QUIET_PERIOD_MS}, got {}",
                    self.quiet_period_ms
                ),
            });
        }
        if self.min_search_chars == 0 {
            return Err(ConfigError::Invalid {
                message: "min_search_chars must be at least 1".to_string(),
            });
        }
        if self.min_resolve_chars == 0 {
            return Err(ConfigError::Invalid {
                message: "min_resolve_chars must be at least 1".to_string(),
            });
        }
        if self.suggestion_limit == 0 {
            return Err(ConfigError::Invalid {
                message: "suggestion_limit must be at least 1".to_string(),
            });
        }
        if self.provider.trim().is_empty() {
            return Err(ConfigError::Invalid {
                message: "provider must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// The debounce quiet period.
    #[must_use]
    pub const fn quiet_period(&self) -> Duration {
        Duration::from_millis(self.quiet_period_ms)
    }
}
