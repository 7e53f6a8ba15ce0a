//! Integration tests for the Store with saved state backends
//!
//! Exercises the store against the mock backends from `tilegrid-testing`:
//! write ordering, failure recording and observer lifecycles.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use std::sync::{Arc, Mutex, PoisonError};
use tilegrid_core::{SmallVec, effect::Effect, reducer::Reducer, saved_state::SavedState, smallvec};
use tilegrid_runtime::{DeadLetterQueue, Store, StoreConfig};
use tilegrid_testing::{FailingSavedState, InMemorySavedState, init_test_tracing};

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, Default)]
struct TallyState {
    total: u64,
    failed: u64,
}

#[derive(Debug, Clone)]
enum TallyAction {
    Bump,
    BumpFailed,
}

#[derive(Clone)]
struct TallyEnvironment {
    saved_state: Arc<dyn SavedState>,
}

#[derive(Clone)]
struct TallyReducer;

impl Reducer for TallyReducer {
    type State = TallyState;
    type Action = TallyAction;
    type Environment = TallyEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            TallyAction::Bump => {
                state.total += 1;
                smallvec![Effect::write(
                    Arc::clone(&env.saved_state),
                    "total",
                    state.total.to_string(),
                    |_| Some(TallyAction::BumpFailed),
                )]
            },
            TallyAction::BumpFailed => {
                state.failed += 1;
                smallvec![Effect::None]
            },
        }
    }
}

type TallyStore = Store<TallyState, TallyAction, TallyEnvironment, TallyReducer>;

fn store_with(saved_state: Arc<dyn SavedState>) -> TallyStore {
    Store::new(TallyState::default(), TallyReducer, TallyEnvironment { saved_state })
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_every_bump_is_written() {
    init_test_tracing();
    let backend = Arc::new(InMemorySavedState::new());
    let store = store_with(backend.clone());

    for _ in 0..5 {
        store.send(TallyAction::Bump).await;
    }

    assert_eq!(backend.write_count(), 5);
    assert_eq!(backend.value("total").as_deref(), Some("5"));
    assert_eq!(store.peek(|s| s.total), 5);
}

#[tokio::test]
async fn test_failures_are_counted_but_do_not_block() {
    init_test_tracing();
    let backend = Arc::new(FailingSavedState::new());
    let store = store_with(backend.clone());

    store.send(TallyAction::Bump).await;
    store.send(TallyAction::Bump).await;

    assert_eq!(backend.attempts(), 2);
    assert_eq!(store.peek(|s| (s.total, s.failed)), (2, 2));

    let entries = store.dlq().drain();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].payload, "total=1");
    assert!(entries[1].error_message.contains("storage offline"));
    assert!(store.health().status.is_healthy());
}

#[tokio::test]
async fn test_observers_notified_in_registration_order() {
    let store = store_with(Arc::new(InMemorySavedState::new()));
    let log = Arc::new(Mutex::new(Vec::new()));

    let first_log = Arc::clone(&log);
    let _first = store
        .subscribe(move |s: &TallyState| {
            first_log.lock().unwrap_or_else(PoisonError::into_inner).push(("first", s.total));
        })
        .await;
    let second_log = Arc::clone(&log);
    let _second = store
        .subscribe(move |s: &TallyState| {
            second_log.lock().unwrap_or_else(PoisonError::into_inner).push(("second", s.total));
        })
        .await;

    store.send(TallyAction::Bump).await;

    let log = log.lock().unwrap_or_else(PoisonError::into_inner);
    assert_eq!(
        *log,
        vec![("first", 0), ("second", 0), ("first", 1), ("second", 1)]
    );
}

#[tokio::test]
async fn test_dropped_subscription_stops_notifications() {
    let store = store_with(Arc::new(InMemorySavedState::new()));
    let calls = Arc::new(Mutex::new(0_u32));

    let sink = Arc::clone(&calls);
    let subscription = store
        .subscribe(move |_: &TallyState| {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        })
        .await;
    assert_eq!(store.observer_count(), 1);

    store.send(TallyAction::Bump).await;
    drop(subscription);
    store.send(TallyAction::Bump).await;

    assert_eq!(store.observer_count(), 0);
    assert_eq!(*calls.lock().unwrap_or_else(PoisonError::into_inner), 2);
    assert_eq!(store.peek(|s| s.total), 2);
}

#[tokio::test]
async fn test_clones_share_state_and_observers() {
    let store = store_with(Arc::new(InMemorySavedState::new()));
    let clone = store.clone();

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let _subscription = store
        .subscribe(move |s: &TallyState| {
            sink.lock().unwrap_or_else(PoisonError::into_inner).push(s.total);
        })
        .await;

    clone.send(TallyAction::Bump).await;

    assert_eq!(store.peek(|s| s.total), 1);
    assert_eq!(*seen.lock().unwrap_or_else(PoisonError::into_inner), vec![0, 1]);
}

#[test]
fn test_send_from_blocking_context() {
    let store = store_with(Arc::new(InMemorySavedState::new()));
    tokio_test::block_on(store.send(TallyAction::Bump));
    assert_eq!(store.peek(|s| s.total), 1);
}

proptest! {
    #[test]
    fn prop_total_matches_sends(sends in 0_usize..40) {
        let backend = Arc::new(InMemorySavedState::new());
        let store = store_with(backend.clone());

        tokio_test::block_on(async {
            for _ in 0..sends {
                store.send(TallyAction::Bump).await;
            }
        });

        prop_assert_eq!(store.peek(|s| s.total), sends as u64);
        prop_assert_eq!(backend.write_count(), sends);
    }

    #[test]
    fn prop_dlq_never_exceeds_capacity(capacity in 0_usize..8, failures in 0_usize..20) {
        let dlq: DeadLetterQueue<usize> = DeadLetterQueue::new(capacity);
        for i in 0..failures {
            dlq.push(i, "failed".to_string());
        }

        prop_assert_eq!(dlq.len(), failures.min(capacity));
        if let Some(latest) = dlq.latest() {
            prop_assert_eq!(latest.payload, failures - 1);
        }
    }

    #[test]
    fn prop_failed_sends_fill_dlq_up_to_capacity(capacity in 1_usize..6, sends in 0_usize..12) {
        let store = Store::with_config(
            TallyState::default(),
            TallyReducer,
            TallyEnvironment { saved_state: Arc::new(FailingSavedState::new()) },
            StoreConfig::default().with_dlq_max_size(capacity),
        );

        tokio_test::block_on(async {
            for _ in 0..sends {
                store.send(TallyAction::Bump).await;
            }
        });

        prop_assert_eq!(store.dlq().len(), sends.min(capacity));
        prop_assert_eq!(store.peek(|s| s.failed), sends as u64);
    }
}
