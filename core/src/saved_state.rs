//! Saved state abstraction.
//!
//! A `SavedState` is a small key-value store whose contents outlive the
//! process. Values are plain strings; callers own the encoding.
//!
//! # Implementations
//!
//! - `FileSavedState` (in the `tilegrid` crate): JSON file on disk
//! - `InMemorySavedState` (in `tilegrid-testing`): `HashMap` for tests
//! - `FailingSavedState` (in `tilegrid-testing`): rejects writes

use thiserror::Error;

/// Errors that can occur during saved state operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SavedStateError {
    /// Backing storage could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// Stored data could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend refused the operation.
    #[error("Saved state unavailable: {0}")]
    Unavailable(String),
}

/// Key-value persistence for state that must survive process recreation.
///
/// Implementations must be `Send + Sync`; the store calls them while holding
/// its state lock, so operations should be short.
pub trait SavedState: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SavedStateError`] if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, SavedStateError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`SavedStateError`] if the value was not durably recorded.
    fn set(&self, key: &str, value: &str) -> Result<(), SavedStateError>;
}
