//! Reducer logic for the tile counter.
//!
//! Adding a tile bumps the count and describes a write of the new count to
//! saved state. The store executes that write before it publishes the new
//! count, so observers never see a value that was not at least attempted to
//! be saved.

use crate::types::{CounterAction, CounterState, ITEM_COUNT_KEY};
use std::sync::Arc;
use tilegrid_core::{SmallVec, effect::Effect, reducer::Reducer, saved_state::SavedState, smallvec};

/// Counter environment
#[derive(Clone)]
pub struct CounterEnvironment {
    /// Where the tile count survives process recreation
    pub saved_state: Arc<dyn SavedState>,
}

impl CounterEnvironment {
    /// Create a new counter environment backed by `saved_state`
    #[must_use]
    pub fn new(saved_state: Arc<dyn SavedState>) -> Self {
        Self { saved_state }
    }
}

impl std::fmt::Debug for CounterEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterEnvironment").finish_non_exhaustive()
    }
}

/// Counter reducer
#[derive(Debug, Clone, Copy, Default)]
pub struct CounterReducer;

impl CounterReducer {
    /// Create a new counter reducer
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for CounterReducer {
    type State = CounterState;
    type Action = CounterAction;
    type Environment = CounterEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            CounterAction::AddItem => {
                if state.count == u64::MAX {
                    tracing::warn!(count = state.count, "Tile count is at its maximum, not incremented");
                }
                state.count = state.count.saturating_add(1);
                state.last_persist_error = None;

                let count = state.count;
                smallvec![Effect::write(
                    Arc::clone(&env.saved_state),
                    ITEM_COUNT_KEY,
                    count.to_string(),
                    move |error| {
                        Some(CounterAction::PersistFailed {
                            count,
                            error: error.to_string(),
                        })
                    },
                )]
            },
            CounterAction::PersistFailed { count, error } => {
                state.last_persist_error = Some(format!("tile count {count} was not saved: {error}"));
                smallvec![Effect::None]
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilegrid_testing::{InMemorySavedState, ReducerTest, assertions};

    fn test_env() -> CounterEnvironment {
        CounterEnvironment::new(Arc::new(InMemorySavedState::new()))
    }

    #[test]
    fn test_add_item() {
        ReducerTest::new(CounterReducer::new())
            .with_env(test_env())
            .given_state(CounterState::new(0))
            .when_action(CounterAction::AddItem)
            .then_state(|state| assert_eq!(state.count, 1))
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_writes(effects, ITEM_COUNT_KEY, "1");
            })
            .run();
    }

    #[test]
    fn test_add_three_items() {
        ReducerTest::new(CounterReducer::new())
            .with_env(test_env())
            .given_state(CounterState::new(0))
            .when_action(CounterAction::AddItem)
            .when_action(CounterAction::AddItem)
            .when_action(CounterAction::AddItem)
            .then_state(|state| assert_eq!(state.count, 3))
            .then_effects(|effects| assertions::assert_writes(effects, ITEM_COUNT_KEY, "3"))
            .run();
    }

    #[test]
    fn test_persist_failed_records_error() {
        ReducerTest::new(CounterReducer::new())
            .with_env(test_env())
            .given_state(CounterState::new(4))
            .when_action(CounterAction::PersistFailed {
                count: 4,
                error: "disk full".to_string(),
            })
            .then_state(|state| {
                assert_eq!(state.count, 4);
                assert_eq!(
                    state.last_persist_error.as_deref(),
                    Some("tile count 4 was not saved: disk full")
                );
            })
            .then_effects(|effects| assertions::assert_no_effects(effects))
            .run();
    }

    #[test]
    fn test_add_at_maximum_saturates() {
        ReducerTest::new(CounterReducer::new())
            .with_env(test_env())
            .given_state(CounterState::new(u64::MAX))
            .when_action(CounterAction::AddItem)
            .then_state(|state| assert_eq!(state.count, u64::MAX))
            .then_effects(|effects| {
                assertions::assert_writes(effects, ITEM_COUNT_KEY, &u64::MAX.to_string());
            })
            .run();
    }

    #[test]
    fn test_add_clears_previous_error() {
        let mut state = CounterState {
            count: 2,
            last_persist_error: Some("earlier failure".to_string()),
        };
        let effects = CounterReducer::new().reduce(&mut state, CounterAction::AddItem, &test_env());

        assert_eq!(state, CounterState::new(3));
        assert_eq!(effects.len(), 1);
    }
}
