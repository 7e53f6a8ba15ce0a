//! # Tile Grid
//!
//! A screen of numbered tiles with an add button. The tile count is the only
//! state; it survives restarts through a saved state backend.
//!
//! ## Architecture
//!
//! - [`CounterStore`] owns the count. Adding a tile reduces
//!   [`CounterAction::AddItem`], writes the new count to saved state and only
//!   then publishes it to observers.
//! - [`grid`] is a pure function of the count: tile labels, alternating
//!   colours and the padding that keeps the add button off the last row.
//! - [`TextRenderer`] draws a [`grid::GridLayout`] for a terminal.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use tilegrid::{CounterEnvironment, CounterStore, grid};
//! use tilegrid_testing::InMemorySavedState;
//!
//! # tokio_test::block_on(async {
//! let store = CounterStore::initialize(CounterEnvironment::new(Arc::new(
//!     InMemorySavedState::new(),
//! )));
//!
//! store.add_item().await;
//! store.add_item().await;
//!
//! let tiles = grid::render(store.current_value(), &grid::GridConfig::default());
//! assert_eq!(tiles.len(), 2);
//! assert_eq!(tiles[1].label, 2);
//! # });
//! ```

pub mod config;
pub mod counter_store;
pub mod grid;
pub mod input;
pub mod persistence;
pub mod reducer;
pub mod text_renderer;
pub mod types;

pub use config::{AppConfig, ConfigError};
pub use counter_store::CounterStore;
pub use persistence::FileSavedState;
pub use reducer::{CounterEnvironment, CounterReducer};
pub use text_renderer::TextRenderer;
pub use types::{CounterAction, CounterState, ITEM_COUNT_KEY};
