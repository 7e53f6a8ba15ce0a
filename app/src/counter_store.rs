//! The counter store: single source of truth for the tile count.
//!
//! `CounterStore` wraps a runtime [`Store`] running [`CounterReducer`]. It is
//! owned by whatever composes the screen; there is no global instance.

use crate::reducer::{CounterEnvironment, CounterReducer};
use crate::types::{CounterAction, CounterState, ITEM_COUNT_KEY};
use tilegrid_runtime::{DeadLetterQueue, HealthCheck, Store, StoreConfig, Subscription};
use tokio::sync::watch;

/// Runtime store specialised to the tile counter
pub type CounterRuntime = Store<CounterState, CounterAction, CounterEnvironment, CounterReducer>;

/// Observable, persisted tile count
///
/// Cloning is cheap; clones share the same count and observers.
#[derive(Clone)]
pub struct CounterStore {
    store: CounterRuntime,
}

impl CounterStore {
    /// Restore the count from `environment`'s saved state and start a store
    ///
    /// A missing, unreadable or corrupt saved value starts the count at 0.
    #[must_use]
    pub fn initialize(environment: CounterEnvironment) -> Self {
        Self::with_config(environment, StoreConfig::default())
    }

    /// Like [`CounterStore::initialize`], with custom runtime configuration
    #[must_use]
    pub fn with_config(environment: CounterEnvironment, config: StoreConfig) -> Self {
        let persisted = match environment.saved_state.get(ITEM_COUNT_KEY) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(error = %error, "Could not read saved tile count, starting from 0");
                None
            },
        };

        let initial = CounterState::restore(persisted.as_deref());
        tracing::info!(count = initial.count, "Counter initialized");

        Self {
            store: Store::with_config(initial, CounterReducer::new(), environment, config),
        }
    }

    /// Append one tile
    ///
    /// The new count is written to saved state and then published to every
    /// observer. A failed write is recorded (see
    /// [`CounterStore::last_persist_error`]) but never stops the count from
    /// advancing.
    ///
    /// At `u64::MAX` the count saturates: a warning is logged and the same
    /// value is written and published again.
    pub async fn add_item(&self) {
        self.store.send(CounterAction::AddItem).await;
    }

    /// The latest published count
    #[must_use]
    pub fn current_value(&self) -> u64 {
        self.store.peek(|state| state.count)
    }

    /// Why the most recent write failed, if the last add could not be saved
    #[must_use]
    pub fn last_persist_error(&self) -> Option<String> {
        self.store.peek(|state| state.last_persist_error.clone())
    }

    /// Call `observer` with the current count and then with every new count
    ///
    /// Notifications stop when the returned [`Subscription`] is dropped or
    /// unsubscribed. Observers must not call back into this store.
    pub async fn subscribe<F>(&self, mut observer: F) -> Subscription
    where
        F: FnMut(u64) + Send + 'static,
    {
        self.store.subscribe(move |state: &CounterState| observer(state.count)).await
    }

    /// Async receiver of every published counter state
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<CounterState> {
        self.store.watch()
    }

    /// Health of the underlying store; degraded once a write has failed
    #[must_use]
    pub fn health(&self) -> HealthCheck {
        self.store.health()
    }

    /// Failed writes recorded by the underlying store
    #[must_use]
    pub fn dlq(&self) -> DeadLetterQueue<String> {
        self.store.dlq()
    }
}

impl std::fmt::Debug for CounterStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CounterStore")
            .field("count", &self.current_value())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex, PoisonError};
    use tilegrid_testing::{FailingSavedState, InMemorySavedState, UnreadableSavedState};

    #[tokio::test]
    async fn starts_at_zero_without_saved_value() {
        let store = CounterStore::initialize(CounterEnvironment::new(Arc::new(
            InMemorySavedState::new(),
        )));
        assert_eq!(store.current_value(), 0);
    }

    #[tokio::test]
    async fn starts_at_zero_when_saved_state_unreadable() {
        let store = CounterStore::initialize(CounterEnvironment::new(Arc::new(UnreadableSavedState)));
        assert_eq!(store.current_value(), 0);
    }

    #[tokio::test]
    async fn add_item_persists_then_publishes() {
        let saved = Arc::new(InMemorySavedState::new());
        let store = CounterStore::initialize(CounterEnvironment::new(saved.clone()));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observed = Arc::clone(&saved);
        let _subscription = store
            .subscribe(move |count| {
                let persisted = observed.value(ITEM_COUNT_KEY);
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push((count, persisted));
            })
            .await;

        store.add_item().await;

        let seen = seen.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(
            *seen,
            vec![(0, None), (1, Some("1".to_string()))]
        );
    }

    #[tokio::test]
    async fn failed_write_still_advances() {
        let saved = Arc::new(FailingSavedState::with_entry(ITEM_COUNT_KEY, "2"));
        let store = CounterStore::initialize(CounterEnvironment::new(saved.clone()));

        store.add_item().await;

        assert_eq!(store.current_value(), 3);
        assert_eq!(saved.attempts(), 1);
        let error = store.last_persist_error();
        assert!(error.is_some_and(|e| e.contains("tile count 3 was not saved")));
        assert!(store.health().status.is_degraded());
        assert_eq!(store.dlq().len(), 1);
    }

    #[tokio::test]
    async fn add_at_maximum_keeps_count() {
        let max = u64::MAX.to_string();
        let saved = Arc::new(InMemorySavedState::with_entry(ITEM_COUNT_KEY, max.as_str()));
        let store = CounterStore::initialize(CounterEnvironment::new(saved.clone()));

        store.add_item().await;

        assert_eq!(store.current_value(), u64::MAX);
        assert_eq!(saved.value(ITEM_COUNT_KEY), Some(max));
        assert!(store.health().status.is_healthy());
    }

    #[tokio::test]
    async fn watch_follows_adds() {
        let store = CounterStore::initialize(CounterEnvironment::new(Arc::new(
            InMemorySavedState::new(),
        )));
        let mut rx = store.watch();

        store.add_item().await;
        store.add_item().await;

        assert_eq!(rx.borrow_and_update().count, 2);
    }
}
