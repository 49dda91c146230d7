//! Proactive cost-based throttling for GraphQL calls.
//!
//! Shopify allows a fixed number of query-cost points per second (50 for
//! regular shops, 100 for Plus). Rather than waiting for a `THROTTLED`
//! response, the limiter compares the most recent recorded cost against the
//! budget and sleeps out the remainder of the one-second window when the
//! budget was already consumed.
//!
//! This is a deliberate sliding-window approximation rather than a token
//! bucket: history is reset whenever a decision is reached instead of
//! decaying continuously. The observable guarantees are the ones that
//! matter - the client never fires into an exhausted window and never stalls
//! when under budget.

use std::time::Duration;

use crate::limits::store::{CostSample, CostStore};

/// Width of the cost accounting window.
pub const COST_WINDOW_MS: u64 = 1_000;

/// Decides whether a request must wait before it can be issued, based on the
/// cost history recorded for this client.
#[derive(Debug)]
pub struct CostLimiter {
    store: CostStore,
    budget: u32,
}

impl CostLimiter {
    /// Creates a limiter with the given per-second cost budget.
    #[must_use]
    pub fn new(budget: u32) -> Self {
        Self {
            store: CostStore::new(),
            budget,
        }
    }

    /// Returns the per-second cost budget.
    #[must_use]
    pub const fn budget(&self) -> u32 {
        self.budget
    }

    /// Returns the underlying cost store.
    #[must_use]
    pub const fn store(&self) -> &CostStore {
        &self.store
    }

    /// Evaluates the recorded history and returns how long the caller must
    /// sleep before firing the next request, or `None` when no delay is
    /// needed.
    ///
    /// The whole read-evaluate-reset sequence runs under a single lock:
    ///
    /// - no history: no delay
    /// - last call older than the window: budget replenished, reset, no delay
    /// - within the window, last cost under budget: no delay
    /// - within the window, at/over budget: delay for the remainder of the
    ///   window, and reset
    pub fn check(&self, now_ms: u64) -> Option<Duration> {
        self.store.with_samples(|samples| {
            let last = *samples.last()?;
            let elapsed = now_ms.saturating_sub(last.at_ms);

            if elapsed >= COST_WINDOW_MS {
                samples.clear();
                return None;
            }

            if last.cost < self.budget {
                return None;
            }

            samples.clear();
            Some(Duration::from_millis(COST_WINDOW_MS - elapsed))
        })
    }

    /// Records the actual cost of a completed call.
    pub fn record(&self, now_ms: u64, cost: u32) {
        self.store.append(CostSample { at_ms: now_ms, cost });
        tracing::trace!(cost, "recorded query cost");
    }
}
