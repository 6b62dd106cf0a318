//! Data block configuration.
//!
//! Controls decode limits applied to untrusted buffers received from other
//! stages, and whether producing stages serialize null information.

use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_MAX_BLOCK_SIZE, DEFAULT_MAX_STRING_LENGTH};

/// Data block configuration.
///
/// # Example
///
/// ```rust
/// use strata_common::config::DataBlockConfig;
///
/// let config = DataBlockConfig::builder()
///     .max_block_size(1024 * 1024)
///     .null_handling_enabled(false)
///     .build();
/// assert_eq!(config.max_block_size, 1024 * 1024);
/// assert!(!config.null_handling_enabled);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataBlockConfig {
    /// Largest serialized block accepted by the decoder, in bytes.
    #[serde(default = "default_max_block_size")]
    pub max_block_size: usize,

    /// Largest single length-prefixed string, in bytes. The fixed-size and
    /// variable-size regions are bounded by `max_block_size` instead.
    #[serde(default = "default_max_string_length")]
    pub max_string_length: usize,

    /// Whether builders append per-column null bitmaps after the row data.
    #[serde(default = "default_null_handling_enabled")]
    pub null_handling_enabled: bool,
}

fn default_max_block_size() -> usize {
    DEFAULT_MAX_BLOCK_SIZE
}

fn default_max_string_length() -> usize {
    DEFAULT_MAX_STRING_LENGTH
}

fn default_null_handling_enabled() -> bool {
    true
}

impl Default for DataBlockConfig {
    fn default() -> Self {
        Self {
            max_block_size: default_max_block_size(),
            max_string_length: default_max_string_length(),
            null_handling_enabled: default_null_handling_enabled(),
        }
    }
}

impl DataBlockConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Saves configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Converts configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Creates a builder for configuration.
    #[must_use]
    pub fn builder() -> DataBlockConfigBuilder {
        DataBlockConfigBuilder::new()
    }
}

/// Builder for data block configuration.
#[derive(Debug, Default)]
pub struct DataBlockConfigBuilder {
    config: DataBlockConfig,
}

impl DataBlockConfigBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum accepted block size.
    #[must_use]
    pub fn max_block_size(mut self, size: usize) -> Self {
        self.config.max_block_size = size;
        self
    }

    /// Sets the maximum accepted string length.
    #[must_use]
    pub fn max_string_length(mut self, len: usize) -> Self {
        self.config.max_string_length = len;
        self
    }

    /// Enables or disables null bitmap serialization.
    #[must_use]
    pub fn null_handling_enabled(mut self, enabled: bool) -> Self {
        self.config.null_handling_enabled = enabled;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> DataBlockConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = DataBlockConfig::default();
        assert_eq!(config.max_block_size, DEFAULT_MAX_BLOCK_SIZE);
        assert_eq!(config.max_string_length, DEFAULT_MAX_STRING_LENGTH);
        assert!(config.null_handling_enabled);
    }

    #[test]
    fn test_builder() {
        let config = DataBlockConfig::builder()
            .max_block_size(4096)
            .max_string_length(128)
            .null_handling_enabled(false)
            .build();

        assert_eq!(config.max_block_size, 4096);
        assert_eq!(config.max_string_length, 128);
        assert!(!config.null_handling_enabled);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: DataBlockConfig = toml::from_str("max_block_size = 2048").unwrap();
        assert_eq!(config.max_block_size, 2048);
        assert_eq!(config.max_string_length, DEFAULT_MAX_STRING_LENGTH);
        assert!(config.null_handling_enabled);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("datablock.toml");

        let config = DataBlockConfig::builder()
            .max_block_size(1 << 20)
            .null_handling_enabled(false)
            .build();
        config.save(&path).unwrap();

        let loaded = DataBlockConfig::from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
