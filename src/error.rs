//! Error types for the frame layer.

use thiserror::Error;

/// Result type alias for frame operations
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while reading or mutating a frame
///
/// "Not found" and "sorts after everything" are not errors; they are
/// reported through [`SlotSearch`](crate::slot::SlotSearch) and
/// [`HintedSearch`](crate::slot::HintedSearch).
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O error from the underlying file system
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Page does not have enough free space for the operation
    #[error("Page is full, need {needed} bytes but only {available} available")]
    PageFull { needed: usize, available: usize },

    /// Logical slot index beyond the slot directory
    #[error("Slot index {index} out of bounds (tuple count: {count})")]
    SlotOutOfBounds { index: usize, count: usize },

    /// Data corruption detected (bad offsets, truncated tuples, checksum mismatch)
    #[error("Corruption detected: {0}")]
    Corruption(String),

    /// Invalid page format or geometry
    #[error("Invalid page: {0}")]
    InvalidPage(String),

    /// A field comparator could not interpret its input bytes
    #[error("Comparator error: {0}")]
    Comparator(String),

    /// Uniqueness-enforcing insert found an equal key on the page
    #[error("Duplicate key")]
    DuplicateKey,

    /// Invalid frame configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON encoding of a frame dump failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Create a corruption error with a message
    pub fn corruption(msg: impl Into<String>) -> Self {
        Self::Corruption(msg.into())
    }

    /// Create an invalid page error
    pub fn invalid_page(msg: impl Into<String>) -> Self {
        Self::InvalidPage(msg.into())
    }

    /// Create a comparator error
    pub fn comparator(msg: impl Into<String>) -> Self {
        Self::Comparator(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_converts() {
        let json_err = serde_json::from_str::<u32>("{").unwrap_err();
        let err: StorageError = json_err.into();
        assert!(matches!(err, StorageError::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }
}
