//! # Tile Grid Runtime
//!
//! Runtime implementation for the tile grid.
//!
//! This crate provides the [`Store`] that owns a state value, runs the reducer
//! for every action, executes the effects it returns and publishes the result.
//!
//! ## Core Components
//!
//! - **Store**: Owns state, serialises actions, executes effects
//! - **Observers**: Synchronous callbacks notified with every published state
//! - **Dead Letter Queue**: Record of saved state writes that failed
//!
//! ## Publication order
//!
//! For every action the store, while holding its state lock:
//!
//! 1. runs the reducer,
//! 2. executes the returned effects (saved state writes happen here),
//! 3. reduces any feedback actions produced by failed effects,
//! 4. publishes the final state to the watch channel and to observers.
//!
//! A published state is therefore never ahead of what was written.
//!
//! ## Example
//!
//! ```ignore
//! use tilegrid_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! let _subscription = store.subscribe(|state| println!("{state:?}")).await;
//! store.send(Action::DoSomething).await;
//!
//! let value = store.peek(|s| s.some_field);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tilegrid_core::{
    effect::{Effect, SavedStateOperation},
    reducer::Reducer,
};
use tokio::sync::RwLock;

/// Metric descriptions
pub mod metrics;

/// State observers and subscription handles
pub mod observers;

pub use observers::{ObserverId, Subscription};

/// Health check status levels
///
/// Indicates the current health state of a component or system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HealthStatus {
    /// Component is fully operational
    Healthy,

    /// Component is operational but experiencing issues (e.g., failed writes)
    Degraded,

    /// Component is not operational
    Unhealthy,
}

impl HealthStatus {
    /// Check if status is healthy
    #[must_use]
    pub const fn is_healthy(self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// Check if status is degraded
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::Degraded)
    }

    /// Check if status is unhealthy
    #[must_use]
    pub const fn is_unhealthy(self) -> bool {
        matches!(self, Self::Unhealthy)
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Healthy => write!(f, "healthy"),
            Self::Degraded => write!(f, "degraded"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone)]
pub struct HealthCheck {
    /// Name of the component being checked
    pub component: String,

    /// Current health status
    pub status: HealthStatus,

    /// Optional message providing details
    pub message: Option<String>,

    /// Optional metadata (e.g., error counts)
    pub metadata: Vec<(String, String)>,
}

impl HealthCheck {
    /// Create a healthy check result
    #[must_use]
    pub fn healthy(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            message: None,
            metadata: Vec::new(),
        }
    }

    /// Create a degraded check result
    #[must_use]
    pub fn degraded(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Degraded,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Create an unhealthy check result
    #[must_use]
    pub fn unhealthy(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
            metadata: Vec::new(),
        }
    }

    /// Add metadata to the health check
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// Dead letter queue entry
///
/// Represents a failed operation with metadata about the failure.
#[derive(Debug, Clone)]
pub struct DeadLetter<T> {
    /// The failed operation payload
    pub payload: T,

    /// The error message from the failure
    pub error_message: String,

    /// When the operation failed
    pub failed_at: chrono::DateTime<chrono::Utc>,
}

/// Dead Letter Queue for storing failed operations
///
/// Bounded FIFO: when full, the oldest entry is dropped. Thread-safe and
/// cheap to clone (clones share the same queue).
///
/// # Example
///
/// ```
/// use tilegrid_runtime::DeadLetterQueue;
///
/// let dlq = DeadLetterQueue::new(2);
/// dlq.push("item_count=3".to_string(), "disk full".to_string());
/// assert_eq!(dlq.len(), 1);
///
/// for entry in dlq.drain() {
///     assert_eq!(entry.error_message, "disk full");
/// }
/// assert!(dlq.is_empty());
/// ```
#[derive(Debug)]
pub struct DeadLetterQueue<T> {
    queue: Arc<Mutex<VecDeque<DeadLetter<T>>>>,
    max_size: usize,
}

impl<T> DeadLetterQueue<T> {
    /// Create a new dead letter queue holding at most `max_size` entries
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            max_size,
        }
    }

    /// Push a failed operation onto the queue
    ///
    /// If the queue is full, the oldest entry is dropped.
    pub fn push(&self, payload: T, error_message: String) {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);

        if self.max_size == 0 {
            metrics::counter!("dlq.dropped").increment(1);
            return;
        }

        // Drop oldest if at capacity
        if queue.len() >= self.max_size {
            queue.pop_front();
            metrics::counter!("dlq.dropped").increment(1);
            tracing::warn!(
                max_size = self.max_size,
                "DLQ at capacity, dropping oldest entry"
            );
        }

        queue.push_back(DeadLetter {
            payload,
            error_message,
            failed_at: chrono::Utc::now(),
        });

        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("dlq.size").set(queue.len() as f64);
        metrics::counter!("dlq.pushed").increment(1);

        tracing::warn!(queue_size = queue.len(), "Operation added to dead letter queue");
    }

    /// Get the current queue size
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain all entries from the queue
    ///
    /// Returns all entries, oldest first, and empties the queue.
    pub fn drain(&self) -> Vec<DeadLetter<T>> {
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let entries: Vec<_> = queue.drain(..).collect();

        metrics::gauge!("dlq.size").set(0.0);
        metrics::counter!("dlq.drained").increment(entries.len() as u64);
        tracing::info!(count = entries.len(), "Drained dead letter queue");

        entries
    }

    /// Peek at the newest entry without removing it
    #[must_use]
    pub fn latest(&self) -> Option<DeadLetter<T>>
    where
        T: Clone,
    {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .back()
            .cloned()
    }

    /// Get the maximum queue size
    #[must_use]
    pub const fn max_size(&self) -> usize {
        self.max_size
    }
}

impl<T> Clone for DeadLetterQueue<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            max_size: self.max_size,
        }
    }
}

impl<T> Default for DeadLetterQueue<T> {
    fn default() -> Self {
        Self::new(StoreConfig::DEFAULT_DLQ_MAX_SIZE)
    }
}

/// Configuration for Store instances
///
/// # Example
///
/// ```
/// use tilegrid_runtime::StoreConfig;
///
/// let config = StoreConfig::default().with_dlq_max_size(16);
/// assert_eq!(config.dlq_max_size, 16);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Maximum size of the dead letter queue
    pub dlq_max_size: usize,
}

impl StoreConfig {
    /// Default dead letter queue capacity
    pub const DEFAULT_DLQ_MAX_SIZE: usize = 100;

    /// Set the DLQ maximum size
    #[must_use]
    pub const fn with_dlq_max_size(mut self, max_size: usize) -> Self {
        self.dlq_max_size = max_size;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            dlq_max_size: Self::DEFAULT_DLQ_MAX_SIZE,
        }
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, DeadLetterQueue, Effect, HealthCheck, Reducer, RwLock, SavedStateOperation,
        StoreConfig, VecDeque,
    };
    use crate::observers::{ObserverRegistry, Subscription};
    use tokio::sync::watch;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; one writer at a time)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (synchronous, before publication)
    /// 5. Publication (watch channel plus ordered observers)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        dlq: DeadLetterQueue<String>,
        observers: ObserverRegistry<S>,
        published: Arc<watch::Sender<S>>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Clone + Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// Uses [`StoreConfig::default`].
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (published, _) = watch::channel(initial_state.clone());

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                dlq: DeadLetterQueue::new(config.dlq_max_size),
                observers: ObserverRegistry::new(),
                published: Arc::new(published),
            }
        }

        /// Get access to the dead letter queue
        ///
        /// Returns a clone sharing the store's queue.
        #[must_use]
        pub fn dlq(&self) -> DeadLetterQueue<String> {
            self.dlq.clone()
        }

        /// Perform a health check on the Store
        ///
        /// - Healthy: no failed effects recorded
        /// - Degraded: failed effects are waiting in the dead letter queue
        /// - Unhealthy: the dead letter queue is full and dropping records
        #[must_use]
        pub fn health(&self) -> HealthCheck {
            let dlq_size = self.dlq.len();
            let dlq_capacity = self.dlq.max_size();

            let check = if dlq_size == 0 {
                HealthCheck::healthy("store")
            } else if dlq_size >= dlq_capacity {
                HealthCheck::unhealthy("store", "Dead letter queue is full")
            } else {
                HealthCheck::degraded("store", format!("{dlq_size} failed effects recorded"))
            };

            check
                .with_metadata("dlq_size", dlq_size.to_string())
                .with_metadata("dlq_capacity", dlq_capacity.to_string())
                .with_metadata("observers", self.observers.len().to_string())
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Executes returned effects in order
        /// 4. Reduces feedback actions from failed effects
        /// 5. Publishes the resulting state, then releases the lock
        ///
        /// Concurrent `send()` calls serialise on the lock, so each action is
        /// applied exactly once and observers see states in the order they
        /// were produced.
        ///
        /// # Panics
        ///
        /// If the reducer or an observer panics, the panic propagates.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) {
            metrics::counter!("store.commands.total").increment(1);

            let mut state = self.state.write().await;
            tracing::trace!("Acquired write lock on state");

            let mut pending = VecDeque::from([action]);
            while let Some(action) = pending.pop_front() {
                let effects = {
                    let span = tracing::debug_span!("reducer_execution");
                    let _enter = span.enter();

                    let start = std::time::Instant::now();
                    let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                    metrics::histogram!("store.reducer.duration_seconds")
                        .record(start.elapsed().as_secs_f64());

                    tracing::trace!("Reducer completed, returned {} effects", effects.len());
                    effects
                };

                for effect in effects {
                    if let Some(feedback) = self.execute_effect(effect) {
                        tracing::debug!("Effect produced a feedback action");
                        pending.push_back(feedback);
                    }
                }
            }

            self.published.send_replace((*state).clone());
            self.observers.notify(&*state);
            tracing::debug!("State published");
        }

        /// Read current state via a closure
        ///
        /// Waits for any in-flight `send()` to finish.
        ///
        /// ```ignore
        /// let count = store.state(|s| s.count).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Read the last published state via a closure, without waiting
        ///
        /// Never blocks on an in-flight `send()`; it sees the state as of the
        /// most recent publication.
        pub fn peek<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            f(&*self.published.borrow())
        }

        /// Receiver of every published state
        ///
        /// The receiver starts with the current state marked as seen.
        #[must_use]
        pub fn watch(&self) -> watch::Receiver<S> {
            self.published.subscribe()
        }

        /// Register an observer
        ///
        /// The observer is called immediately with the current state and then
        /// with every state published afterwards, in registration order
        /// relative to other observers. It stays registered until the returned
        /// [`Subscription`] is dropped or unsubscribed.
        ///
        /// The observer runs inside the store's critical section; it must not
        /// call back into this store.
        pub async fn subscribe<F>(&self, mut observer: F) -> Subscription
        where
            F: FnMut(&S) + Send + 'static,
        {
            // Holding the read lock keeps sends out until the observer is registered
            let state = self.state.read().await;
            observer(&*state);
            self.observers.register(Box::new(observer))
        }

        /// Number of registered observers
        #[must_use]
        pub fn observer_count(&self) -> usize {
            self.observers.len()
        }

        /// Execute one effect, returning its feedback action if any
        fn execute_effect(&self, effect: Effect<A>) -> Option<A> {
            match effect {
                Effect::None => {
                    tracing::trace!("Executing Effect::None (no-op)");
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                    None
                },
                Effect::SavedState(SavedStateOperation::Write {
                    saved_state,
                    key,
                    value,
                    on_error,
                }) => {
                    metrics::counter!("store.effects.executed", "type" => "saved_state")
                        .increment(1);

                    match saved_state.set(&key, &value) {
                        Ok(()) => {
                            tracing::debug!(key = %key, value = %value, "Saved state written");
                            None
                        },
                        Err(error) => {
                            metrics::counter!("store.persist.failed").increment(1);
                            tracing::warn!(
                                key = %key,
                                value = %value,
                                error = %error,
                                "Saved state write failed"
                            );
                            self.dlq.push(format!("{key}={value}"), error.to_string());
                            on_error(error)
                        },
                    }
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                dlq: self.dlq.clone(),
                observers: self.observers.clone(),
                published: Arc::clone(&self.published),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
