//! # Tile Grid Core
//!
//! Core traits and types for the tile grid.
//!
//! The grid screen is driven by one persisted counter. Everything that changes
//! it goes through a reducer, and everything that touches the outside world is
//! described as an [`effect::Effect`] and executed by the runtime.
//!
//! ## Core Concepts
//!
//! - **State**: Domain state owned by a store
//! - **Action**: All possible inputs to a reducer
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits ([`saved_state::SavedState`])
//!
//! ## Example
//!
//! ```
//! use tilegrid_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Clone, Debug, Default)]
//! struct TapState {
//!     taps: u64,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum TapAction {
//!     Tap,
//! }
//!
//! struct TapReducer;
//!
//! impl Reducer for TapReducer {
//!     type State = TapState;
//!     type Action = TapAction;
//!     type Environment = ();
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TapState,
//!         action: TapAction,
//!         _env: &(),
//!     ) -> SmallVec<[Effect<TapAction>; 4]> {
//!         match action {
//!             TapAction::Tap => state.taps += 1,
//!         }
//!         smallvec![Effect::None]
//!     }
//! }
//!
//! let mut state = TapState::default();
//! TapReducer.reduce(&mut state, TapAction::Tap, &());
//! assert_eq!(state.taps, 1);
//! ```

pub use smallvec::{SmallVec, smallvec};

/// Key-value persistence that survives process recreation
pub mod saved_state;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Updates state in place
        /// 2. Returns effect descriptions to be executed
        ///
        /// # Arguments
        ///
        /// - `state`: Mutable reference to current state
        /// - `action`: The action to process
        /// - `env`: Reference to injected dependencies
        ///
        /// # Returns
        ///
        /// Effects to be executed by the runtime, in order
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values, not execution.
pub mod effect {
    use crate::saved_state::{SavedState, SavedStateError};
    use std::sync::Arc;

    /// Callback turning a failed saved-state write into an optional feedback action
    pub type OnSavedStateError<Action> =
        Box<dyn FnOnce(SavedStateError) -> Option<Action> + Send>;

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Saved state operation
        ///
        /// Executed synchronously by the store before the new state is
        /// published to observers.
        SavedState(SavedStateOperation<Action>),
    }

    /// Operations against a [`SavedState`] backend
    pub enum SavedStateOperation<Action> {
        /// Write `value` under `key`
        Write {
            /// Backend to write to
            saved_state: Arc<dyn SavedState>,
            /// Key to write
            key: String,
            /// Encoded value
            value: String,
            /// Feedback action when the write fails
            on_error: OnSavedStateError<Action>,
        },
    }

    // Manual Debug implementation since the callbacks don't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::SavedState(op) => f.debug_tuple("Effect::SavedState").field(op).finish(),
            }
        }
    }

    impl<Action> std::fmt::Debug for SavedStateOperation<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                SavedStateOperation::Write { key, value, .. } => f
                    .debug_struct("SavedStateOperation::Write")
                    .field("key", key)
                    .field("value", value)
                    .finish_non_exhaustive(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Describe a write of `value` under `key`
        #[must_use]
        pub fn write(
            saved_state: Arc<dyn SavedState>,
            key: impl Into<String>,
            value: impl Into<String>,
            on_error: impl FnOnce(SavedStateError) -> Option<Action> + Send + 'static,
        ) -> Self {
            Effect::SavedState(SavedStateOperation::Write {
                saved_state,
                key: key.into(),
                value: value.into(),
                on_error: Box::new(on_error),
            })
        }

        /// Whether this effect does nothing
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}
