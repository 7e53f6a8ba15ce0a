//! State observers.
//!
//! Observers are plain callbacks. The store invokes them synchronously, in
//! registration order, every time it publishes a new state. A [`Subscription`]
//! keeps its observer registered; dropping it (or calling
//! [`Subscription::unsubscribe`]) removes the observer.
//!
//! Observers run while the store holds its state lock. They must not send
//! actions to, or subscribe to, the store that notifies them. Dropping a
//! `Subscription` from inside an observer is allowed.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

/// Boxed observer callback
type Observer<S> = Box<dyn FnMut(&S) + Send>;

/// Identifier assigned to each registered observer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

impl ObserverId {
    /// Raw id value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

struct Registry<S> {
    next_id: u64,
    observers: Vec<(ObserverId, Observer<S>)>,
    /// Observers taken out by a `notify` in progress
    in_flight: usize,
    /// In-flight observers unregistered before `notify` put them back
    removed: HashSet<ObserverId>,
}

impl<S> Registry<S> {
    fn active(&self) -> usize {
        self.observers.len() + self.in_flight.saturating_sub(self.removed.len())
    }

    fn record_gauge(&self) {
        #[allow(clippy::cast_precision_loss)]
        metrics::gauge!("store.observers").set(self.active() as f64);
    }
}

/// Something a [`Subscription`] can remove itself from
trait Unregister: Send + Sync {
    fn unregister(&self, id: ObserverId);
}

impl<S> Unregister for Mutex<Registry<S>> {
    fn unregister(&self, id: ObserverId) {
        let mut registry = self.lock().unwrap_or_else(PoisonError::into_inner);
        let before = registry.observers.len();
        registry.observers.retain(|(observer_id, _)| *observer_id != id);
        if registry.observers.len() == before && registry.in_flight > 0 {
            registry.removed.insert(id);
        }

        registry.record_gauge();
        tracing::trace!(observer = id.0, "Observer unregistered");
    }
}

/// Ordered list of observers for one store
pub(crate) struct ObserverRegistry<S> {
    inner: Arc<Mutex<Registry<S>>>,
}

impl<S: 'static> ObserverRegistry<S> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Registry {
                next_id: 0,
                observers: Vec::new(),
                in_flight: 0,
                removed: HashSet::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Registry<S>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an observer; it will be notified after all earlier ones
    pub(crate) fn register(&self, observer: Observer<S>) -> Subscription {
        let mut registry = self.lock();
        let id = ObserverId(registry.next_id);
        registry.next_id += 1;
        registry.observers.push((id, observer));

        registry.record_gauge();
        tracing::trace!(observer = id.0, "Observer registered");

        let inner: Arc<dyn Unregister> = self.inner.clone();
        Subscription {
            id,
            registry: Some(Arc::downgrade(&inner)),
        }
    }

    /// Invoke every observer with `state`, in registration order
    ///
    /// The registry lock is not held while observers run, so an observer may
    /// drop any [`Subscription`], including its own. An observer unsubscribed
    /// during the round is not called for the rest of it.
    pub(crate) fn notify(&self, state: &S) {
        let mut running = {
            let mut registry = self.lock();
            registry.in_flight = registry.observers.len();
            std::mem::take(&mut registry.observers)
        };

        for (id, observer) in &mut running {
            let unsubscribed = self.lock().removed.contains(id);
            if !unsubscribed {
                observer(state);
            }
        }

        let mut registry = self.lock();
        let removed = std::mem::take(&mut registry.removed);
        running.retain(|(id, _)| !removed.contains(id));
        let registered_meanwhile = std::mem::replace(&mut registry.observers, running);
        registry.observers.extend(registered_meanwhile);
        registry.in_flight = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().active()
    }
}

impl<S> Clone for ObserverRegistry<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Handle for a registered observer
///
/// The observer stays registered for as long as the handle lives.
#[must_use = "dropping a Subscription unsubscribes its observer"]
pub struct Subscription {
    id: ObserverId,
    registry: Option<Weak<dyn Unregister>>,
}

impl Subscription {
    /// Id of the observer this handle keeps registered
    pub const fn id(&self) -> ObserverId {
        self.id
    }

    /// Stop notifications to this observer
    ///
    /// Has no effect on the store's state.
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.unregister(self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.registry.as_ref().is_some_and(|w| w.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recorder() -> (Arc<Mutex<Vec<String>>>, impl Fn(&'static str) -> Observer<u32>) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_for_make = Arc::clone(&log);
        let make = move |name: &'static str| -> Observer<u32> {
            let log = Arc::clone(&log_for_make);
            Box::new(move |value: &u32| {
                log.lock().unwrap_or_else(PoisonError::into_inner).push(format!("{name}:{value}"));
            })
        };
        (log, make)
    }

    #[test]
    fn notifies_in_registration_order() {
        let registry = ObserverRegistry::<u32>::new();
        let (log, make) = recorder();

        let _a = registry.register(make("a"));
        let _b = registry.register(make("b"));
        registry.notify(&7);

        let log = log.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(*log, vec!["a:7".to_string(), "b:7".to_string()]);
    }

    #[test]
    fn dropped_subscription_stops_notifications() {
        let registry = ObserverRegistry::<u32>::new();
        let (log, make) = recorder();

        let a = registry.register(make("a"));
        let b = registry.register(make("b"));
        assert_eq!(registry.len(), 2);

        drop(a);
        b.unsubscribe();
        assert_eq!(registry.len(), 0);

        registry.notify(&1);
        assert!(log.lock().unwrap_or_else(PoisonError::into_inner).is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let registry = ObserverRegistry::<u32>::new();
        let first = registry.register(Box::new(|_: &u32| {}));
        let second = registry.register(Box::new(|_: &u32| {}));
        assert_ne!(first.id(), second.id());
        assert!(first.id() < second.id());
    }

    #[test]
    fn observer_can_drop_its_own_subscription() {
        let registry = ObserverRegistry::<u32>::new();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let sink = Arc::clone(&calls);
        let own = Arc::clone(&slot);
        let subscription = registry.register(Box::new(move |value: &u32| {
            sink.lock().unwrap_or_else(PoisonError::into_inner).push(*value);
            if *value == 1 {
                let released = own.lock().unwrap_or_else(PoisonError::into_inner).take();
                drop(released);
            }
        }));
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        registry.notify(&0);
        registry.notify(&1);
        assert_eq!(registry.len(), 0);
        registry.notify(&2);

        assert_eq!(*calls.lock().unwrap_or_else(PoisonError::into_inner), vec![0, 1]);
    }

    #[test]
    fn observer_unsubscribed_mid_round_is_skipped() {
        let registry = ObserverRegistry::<u32>::new();
        let (log, make) = recorder();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let victim = Arc::clone(&slot);
        let _first = registry.register(Box::new(move |_: &u32| {
            let released = victim.lock().unwrap_or_else(PoisonError::into_inner).take();
            drop(released);
        }));
        let second = registry.register(make("second"));
        let _third = registry.register(make("third"));
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(second);

        registry.notify(&4);
        registry.notify(&5);

        assert_eq!(registry.len(), 2);
        let log = log.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(*log, vec!["third:4".to_string(), "third:5".to_string()]);
    }

    #[test]
    fn subscription_outliving_registry_is_harmless() {
        let registry = ObserverRegistry::<u32>::new();
        let subscription = registry.register(Box::new(|_: &u32| {}));
        drop(registry);
        subscription.unsubscribe();
    }
}
