//! Session configuration via `recmap.toml`
//!
//! A session needs little configuration: the namespace used for types that
//! don't pin one, and the retry budget and backoff of `transact_default`.
//! All keys are optional; missing keys take their defaults.

use recmap_concurrency::RetryConfig;
use recmap_core::limits::MAX_NAMESPACE_LEN;
use recmap_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "recmap.toml";

/// Session configuration loaded from `recmap.toml`.
///
/// # Example
///
/// ```toml
/// default_namespace = "test"
/// max_retries = 5
/// retry_base_delay_ms = 1
/// retry_max_delay_ms = 50
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Namespace for types that don't pin one
    #[serde(default = "default_namespace")]
    pub default_namespace: String,
    /// Retry budget of `transact_default`
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,
    /// First backoff delay after a conflict, doubled per attempt
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    /// Backoff ceiling
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

fn default_namespace() -> String {
    "test".to_string()
}

fn default_max_retries() -> usize {
    5
}

fn default_retry_base_delay_ms() -> u64 {
    1
}

fn default_retry_max_delay_ms() -> u64 {
    50
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_namespace: default_namespace(),
            max_retries: default_max_retries(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

impl SessionConfig {
    /// Retry configuration for the transaction manager
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new()
            .with_max_retries(self.max_retries)
            .with_base_delay_ms(self.retry_base_delay_ms)
            .with_max_delay_ms(self.retry_max_delay_ms)
    }

    /// Check the values make sense
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` for an empty or overlong namespace, or a base
    /// delay above the maximum delay.
    pub fn validate(&self) -> Result<()> {
        if self.default_namespace.is_empty() || self.default_namespace.len() > MAX_NAMESPACE_LEN {
            return Err(Error::config(format!(
                "default_namespace '{}' must be 1..={} bytes",
                self.default_namespace, MAX_NAMESPACE_LEN
            )));
        }
        if self.retry_base_delay_ms > self.retry_max_delay_ms {
            return Err(Error::config(format!(
                "retry_base_delay_ms ({}) exceeds retry_max_delay_ms ({})",
                self.retry_base_delay_ms, self.retry_max_delay_ms
            )));
        }
        Ok(())
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# recmap session configuration
#
# Namespace used for types that don't pin their own
default_namespace = "test"

# Retries after the first attempt when transact_default hits a
# generation conflict
max_retries = 5

# Exponential backoff between attempts, in milliseconds
retry_base_delay_ms = 1
retry_max_delay_ms = 50
"#
    }

    /// Parse and validate config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the string cannot be parsed or fails validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: SessionConfig = toml::from_str(content)
            .map_err(|e| Error::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read, parsed or validated.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config { message } => {
                Error::config(format!("{} ({})", message, path.display()))
            }
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::config(format!(
                    "Failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::config(format!(
                "Failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}
