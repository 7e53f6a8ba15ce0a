//! Domain types for the tile counter.
//!
//! The whole screen is driven by one number: how many tiles exist. It starts
//! from whatever was saved last time (or zero), and the only way it changes
//! is by adding one tile.

/// Saved state key under which the tile count is persisted
pub const ITEM_COUNT_KEY: &str = "item_count";

/// Counter state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CounterState {
    /// Number of tiles; only ever grows by one per add
    pub count: u64,
    /// Why the most recent write of `count` failed, if it did
    ///
    /// Cleared by the next add. Diagnostic only: a failed write never holds
    /// back `count`.
    pub last_persist_error: Option<String>,
}

impl CounterState {
    /// State with the given count and no recorded failure
    #[must_use]
    pub const fn new(count: u64) -> Self {
        Self {
            count,
            last_persist_error: None,
        }
    }

    /// State restored from a persisted value
    ///
    /// Absent, empty, negative or otherwise unparsable text restores to 0.
    #[must_use]
    pub fn restore(persisted: Option<&str>) -> Self {
        Self::new(parse_count(persisted))
    }
}

/// Decode a persisted tile count
///
/// The stored format is a plain non-negative decimal integer. Anything else
/// decodes to 0.
#[must_use]
pub fn parse_count(persisted: Option<&str>) -> u64 {
    let Some(text) = persisted else {
        return 0;
    };

    text.parse::<u64>().unwrap_or_else(|error| {
        tracing::warn!(value = text, error = %error, "Ignoring invalid persisted tile count");
        0
    })
}

/// Counter actions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterAction {
    /// Append one tile
    AddItem,
    /// Writing `count` to saved state failed
    PersistFailed {
        /// The count that was not saved
        count: u64,
        /// Error reported by the saved state backend
        error: String,
    },
}
