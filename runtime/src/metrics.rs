//! Metric descriptions for the store runtime.
//!
//! The runtime records through the `metrics` facade only. Nothing is exported
//! unless the host installs a recorder; [`describe_metrics`] attaches help
//! text to every metric the runtime emits so any recorder can show it.
//!
//! | Metric | Kind | Meaning |
//! |--------|------|---------|
//! | `store.commands.total` | counter | Actions sent to a store |
//! | `store.effects.executed` | counter | Effects executed, labelled by `type` |
//! | `store.persist.failed` | counter | Saved state writes that failed |
//! | `store.observers` | gauge | Registered observers |
//! | `dlq.size` | gauge | Entries in the dead letter queue |
//! | `dlq.pushed` | counter | Entries pushed onto the dead letter queue |
//! | `dlq.dropped` | counter | Entries evicted because the queue was full |

use metrics::{describe_counter, describe_gauge, describe_histogram};

// Re-export metrics macros for use in other modules
pub use metrics::{counter, gauge, histogram};

/// Register descriptions for all runtime metrics.
///
/// Safe to call more than once; later calls overwrite the same descriptions.
pub fn describe_metrics() {
    describe_counter!("store.commands.total", "Total number of actions sent to a store");
    describe_counter!(
        "store.effects.executed",
        "Total number of effects executed, labelled by effect type"
    );
    describe_counter!(
        "store.persist.failed",
        "Total number of saved state writes that failed"
    );
    describe_histogram!(
        "store.reducer.duration_seconds",
        "Time taken to run the reducer for one action"
    );
    describe_gauge!("store.observers", "Number of registered state observers");

    describe_gauge!("dlq.size", "Current number of entries in the dead letter queue");
    describe_counter!("dlq.pushed", "Total number of entries pushed onto the dead letter queue");
    describe_counter!(
        "dlq.dropped",
        "Total number of entries evicted from a full dead letter queue"
    );
    describe_counter!("dlq.drained", "Total number of entries drained from the dead letter queue");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_without_recorder_is_noop() {
        describe_metrics();
        describe_metrics();
    }
}
