//! Common types used throughout the frame layer.

mod varint;

pub(crate) use varint::put_varint;
pub use varint::{read_varint, varint_size, write_varint, MAX_VARINT_LEN};

use crate::error::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default page size in bytes (4KB)
pub const PAGE_SIZE: usize = 4096;

/// Smallest page that still fits a header, one slot and a small tuple
pub const MIN_PAGE_SIZE: usize = 64;

/// Largest supported page; slot cells and header offsets are 32-bit but
/// pages beyond 16MB are not useful as B-tree nodes
pub const MAX_PAGE_SIZE: usize = 1 << 24;

/// Width of one slot directory cell (a big-endian u32 tuple offset)
pub const SLOT_SIZE: usize = 4;

/// Level stored in the header of leaf frames
pub const LEAF_LEVEL: u8 = 0;

/// Frame configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameConfig {
    /// Page size in bytes (default: 4096)
    pub page_size: usize,
    /// Whether `from_bytes` verifies the CRC32 of sealed pages (default: true)
    pub verify_checksums: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            page_size: PAGE_SIZE,
            verify_checksums: true,
        }
    }
}

impl FrameConfig {
    /// Create a configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page size
    pub fn page_size(mut self, size: usize) -> Self {
        self.page_size = size;
        self
    }

    /// Enable or disable checksum verification on load
    pub fn verify_checksums(mut self, enabled: bool) -> Self {
        self.verify_checksums = enabled;
        self
    }

    /// Parse a configuration from JSON; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| StorageError::invalid_config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check that the page size is within the supported range
    pub fn validate(&self) -> Result<()> {
        if self.page_size < MIN_PAGE_SIZE || self.page_size > MAX_PAGE_SIZE {
            return Err(StorageError::invalid_config(format!(
                "page size {} outside [{}, {}]",
                self.page_size, MIN_PAGE_SIZE, MAX_PAGE_SIZE
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = FrameConfig::default();
        assert_eq!(config.page_size, PAGE_SIZE);
        assert!(config.verify_checksums);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_json() {
        let config = FrameConfig::from_json(r#"{"pageSize": 8192}"#).unwrap();
        assert_eq!(config.page_size, 8192);
        assert!(config.verify_checksums);

        let config =
            FrameConfig::from_json(r#"{"pageSize": 512, "verifyChecksums": false}"#).unwrap();
        assert_eq!(config, FrameConfig::new().page_size(512).verify_checksums(false));
    }

    #[test]
    fn test_config_rejects_bad_page_size() {
        assert!(matches!(
            FrameConfig::from_json(r#"{"pageSize": 16}"#),
            Err(StorageError::InvalidConfig(_))
        ));
        assert!(FrameConfig::new().page_size(MAX_PAGE_SIZE + 1).validate().is_err());
        assert!(FrameConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frame.json");
        std::fs::write(&path, r#"{"pageSize": 1024, "verifyChecksums": false}"#).unwrap();

        let config = FrameConfig::load(&path).unwrap();
        assert_eq!(config, FrameConfig::new().page_size(1024).verify_checksums(false));

        std::fs::write(&path, r#"{"pageSize": 32}"#).unwrap();
        assert!(matches!(
            FrameConfig::load(&path),
            Err(StorageError::InvalidConfig(_))
        ));

        assert!(matches!(
            FrameConfig::load(dir.path().join("missing.json")),
            Err(StorageError::Io(_))
        ));
    }
}
