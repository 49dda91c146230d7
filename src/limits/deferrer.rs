//! Time source and sleep abstraction.
//!
//! The client never calls `tokio::time::sleep` or reads the clock directly;
//! it goes through a [`Deferrer`] so that throttling, retry backoff, and bulk
//! polling can be driven deterministically in tests.

use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Boxed future returned by [`Deferrer::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Provides the current time and a way to suspend the calling task.
///
/// Implementations must be cooperative: `sleep` suspends only the calling
/// task, never the thread, so concurrent requests on the same runtime are not
/// stalled by one call's backoff.
pub trait Deferrer: Send + Sync {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// Suspends the calling task for the given duration.
    fn sleep(&self, duration: Duration) -> SleepFuture<'_>;
}

/// Production [`Deferrer`] backed by the system clock and `tokio::time::sleep`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SleepDeferrer;

impl Deferrer for SleepDeferrer {
    fn now_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |elapsed| elapsed.as_millis() as u64)
    }

    fn sleep(&self, duration: Duration) -> SleepFuture<'_> {
        Box::pin(tokio::time::sleep(duration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_deferrer_reports_wall_clock() {
        let deferrer = SleepDeferrer;
        let first = deferrer.now_ms();
        let second = deferrer.now_ms();
        assert!(second >= first);
        // Sanity: after 2020.
        assert!(first > 1_577_836_800_000);
    }

    #[tokio::test]
    async fn test_sleep_deferrer_sleeps() {
        let deferrer = SleepDeferrer;
        tokio::time::pause();
        let start = tokio::time::Instant::now();
        deferrer.sleep(Duration::from_millis(250)).await;
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[test]
    fn test_deferrer_is_object_safe() {
        let _: &dyn Deferrer = &SleepDeferrer;
    }
}
