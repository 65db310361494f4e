//! Persisted key/value storage for the Folio client.
//!
//! This crate provides:
//! - [`KeyValueStore`], the synchronous storage capability the rest of the
//!   client depends on
//! - [`FileStore`], a JSON file backend that survives process restarts
//! - [`MemoryStore`], a process-local backend for tests and ephemeral runs
//! - [`CredentialStore`], the high-level API for the persisted credential pair

mod credentials;
mod file;
mod keys;
mod memory;
mod traits;

pub use credentials::CredentialStore;
pub use file::FileStore;
pub use keys::StorageKeys;
pub use memory::MemoryStore;
pub use traits::KeyValueStore;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Backend could not be used (e.g. path is a directory)
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Persisted content could not be decoded
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_keys_constants() {
        assert_eq!(StorageKeys::ACCESS_TOKEN, "accessToken");
        assert_eq!(StorageKeys::REFRESH_TOKEN, "refreshToken");
        assert_eq!(StorageKeys::DOWNLOAD_TOKENS, "downloadTokens");

        let unique: std::collections::HashSet<_> = StorageKeys::ALL.iter().collect();
        assert_eq!(unique.len(), StorageKeys::ALL.len(), "Storage keys must be unique");
    }

    #[test]
    fn test_has_default_uses_get() {
        let store = MemoryStore::new();
        assert!(!store.has("k").unwrap());
        store.set("k", "v").unwrap();
        assert!(store.has("k").unwrap());
    }
}
