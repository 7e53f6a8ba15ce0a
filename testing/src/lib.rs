//! # Tile Grid Testing
//!
//! Testing utilities and helpers for the tile grid.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A fluent `ReducerTest` helper and effect assertions
//! - Property-based testing strategies
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tilegrid_core::saved_state::SavedState;
//! use tilegrid_testing::InMemorySavedState;
//!
//! let saved_state = Arc::new(InMemorySavedState::with_entry("item_count", "3"));
//! assert_eq!(saved_state.get("item_count"), Ok(Some("3".to_string())));
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use tilegrid_core::saved_state::{SavedState, SavedStateError};


pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations for testing.
pub mod mocks {
    use super::{
        AtomicUsize, HashMap, Mutex, Ordering, PoisonError, SavedState, SavedStateError,
    };

    /// In-memory saved state
    ///
    /// Stands in for storage that survives process recreation: share one
    /// instance (behind an `Arc`) between two stores to simulate a restart.
    #[derive(Debug, Default)]
    pub struct InMemorySavedState {
        entries: Mutex<HashMap<String, String>>,
        writes: AtomicUsize,
    }

    impl InMemorySavedState {
        /// Create an empty saved state
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a saved state holding one entry
        #[must_use]
        pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
            let saved = Self::new();
            saved
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.into(), value.into());
            saved
        }

        /// Number of successful `set` calls
        #[must_use]
        pub fn write_count(&self) -> usize {
            self.writes.load(Ordering::SeqCst)
        }

        /// Current value under `key`, bypassing the trait
        #[must_use]
        pub fn value(&self, key: &str) -> Option<String> {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(key)
                .cloned()
        }
    }

    impl SavedState for InMemorySavedState {
        fn get(&self, key: &str) -> Result<Option<String>, SavedStateError> {
            Ok(self.value(key))
        }

        fn set(&self, key: &str, value: &str) -> Result<(), SavedStateError> {
            self.entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key.to_string(), value.to_string());
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Saved state whose writes fail
    ///
    /// Reads return the optional seeded value. Every `set` is counted and
    /// rejected with [`SavedStateError::Unavailable`].
    #[derive(Debug, Default)]
    pub struct FailingSavedState {
        seeded: Option<(String, String)>,
        attempts: AtomicUsize,
    }

    impl FailingSavedState {
        /// Create a failing saved state with nothing stored
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a failing saved state that still reads one entry
        #[must_use]
        pub fn with_entry(key: impl Into<String>, value: impl Into<String>) -> Self {
            Self {
                seeded: Some((key.into(), value.into())),
                attempts: AtomicUsize::new(0),
            }
        }

        /// Number of rejected `set` calls
        #[must_use]
        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    impl SavedState for FailingSavedState {
        fn get(&self, key: &str) -> Result<Option<String>, SavedStateError> {
            Ok(self
                .seeded
                .as_ref()
                .filter(|(seeded_key, _)| seeded_key == key)
                .map(|(_, value)| value.clone()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), SavedStateError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(SavedStateError::Unavailable("storage offline".to_string()))
        }
    }

    /// Saved state whose reads fail
    #[derive(Debug, Default)]
    pub struct UnreadableSavedState;

    impl SavedState for UnreadableSavedState {
        fn get(&self, _key: &str) -> Result<Option<String>, SavedStateError> {
            Err(SavedStateError::Io("unreadable".to_string()))
        }

        fn set(&self, _key: &str, _value: &str) -> Result<(), SavedStateError> {
            Ok(())
        }
    }
}

/// Test helpers and utilities
pub mod helpers {
    /// Install a `tracing` subscriber that writes through the test harness
    ///
    /// Respects `RUST_LOG`. Safe to call from every test; only the first
    /// call installs anything.
    pub fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;

    /// Tile counts small enough to render in a test
    pub fn tile_count() -> impl Strategy<Value = u64> {
        0_u64..512
    }

    /// Sequences of add presses
    pub fn add_presses() -> impl Strategy<Value = usize> {
        0_usize..64
    }

    /// Text that might be found under a persisted integer key
    ///
    /// Mixes valid decimal counts with negative numbers, overflow, padding
    /// and garbage.
    pub fn persisted_text() -> impl Strategy<Value = String> {
        prop_oneof![
            any::<u32>().prop_map(|n| n.to_string()),
            any::<i64>().prop_map(|n| n.to_string()),
            Just(String::new()),
            Just("18446744073709551616".to_string()),
            "[ a-z0-9.-]{0,12}",
        ]
    }
}

// Re-export commonly used items
pub use helpers::init_test_tracing;
pub use mocks::{FailingSavedState, InMemorySavedState, UnreadableSavedState};
