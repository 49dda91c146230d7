//! Recorded cost history for the rate limiter.

use std::sync::Mutex;

/// One completed GraphQL call: when it finished and what it cost.
///
/// The cost is the API's self-declared `extensions.cost.actualQueryCost`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CostSample {
    /// Completion time in milliseconds since the Unix epoch.
    pub at_ms: u64,
    /// Actual query cost in rate-limit points.
    pub cost: u32,
}

/// Append-only store of [`CostSample`]s for one client/session.
///
/// The store is read and cleared atomically by the cost limiter's
/// evaluate-reset sequence, so it never grows beyond the calls made since the
/// last evaluation. The internal mutex makes a shared client safe to use from
/// concurrent tasks; contention is limited to the short evaluate/append
/// critical sections.
#[derive(Debug, Default)]
pub struct CostStore {
    samples: Mutex<Vec<CostSample>>,
}

impl CostStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sample.
    pub fn append(&self, sample: CostSample) {
        self.samples
            .lock()
            .expect("cost store lock poisoned")
            .push(sample);
    }

    /// Returns the most recent sample, if any.
    #[must_use]
    pub fn last(&self) -> Option<CostSample> {
        self.samples
            .lock()
            .expect("cost store lock poisoned")
            .last()
            .copied()
    }

    /// Removes all recorded samples.
    pub fn reset(&self) {
        self.samples
            .lock()
            .expect("cost store lock poisoned")
            .clear();
    }

    /// Returns the number of recorded samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.lock().expect("cost store lock poisoned").len()
    }

    /// Returns `true` if no samples are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` with exclusive access to the sample list.
    ///
    /// This is the read-evaluate-reset primitive used by the limiter: the
    /// whole decision happens under one lock acquisition, so two concurrent
    /// callers cannot both observe the same history.
    pub(crate) fn with_samples<T>(&self, f: impl FnOnce(&mut Vec<CostSample>) -> T) -> T {
        let mut samples = self.samples.lock().expect("cost store lock poisoned");
        f(&mut samples)
    }
}
