//! Retry delay calculations.
//!
//! Three sources of delay, in priority order: the `retry-after` header on a
//! retryable HTTP status, the throttle math on a `THROTTLED` GraphQL error,
//! and exponential backoff when no response exists to consult (transport
//! errors).

use std::time::Duration;

use reqwest::header::HeaderMap;

use crate::clients::graphql::response::ThrottleStatus;

/// Extra cost points requested beyond the query's own cost when waiting out
/// a throttle, so the retry lands with room to spare.
pub(crate) const THROTTLE_COST_HEADROOM: f64 = 50.0;

/// Exponential backoff for retries that have no server hint to follow.
///
/// The delay for retry `n` is `multiplier * 2^(n-1)`, clamped to
/// `[min, max]`. Defaults: multiplier 1s, min 4s, max 10s.
#[derive(Clone, Copy, Debug)]
pub struct BackoffPolicy {
    /// Base unit multiplied by the exponential factor.
    pub multiplier: Duration,
    /// Lower clamp on the computed delay.
    pub min: Duration,
    /// Upper clamp on the computed delay.
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            multiplier: Duration::from_secs(1),
            min: Duration::from_secs(4),
            max: Duration::from_secs(10),
        }
    }
}

impl BackoffPolicy {
    /// Returns the delay before the given retry attempt (1-based).
    #[must_use]
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.multiplier
            .saturating_mul(factor)
            .clamp(self.min, self.max)
    }
}

/// Reads the `retry-after` header as fractional seconds.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<f64> {
    headers
        .get("retry-after")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Delay before retrying a retryable HTTP status: the `retry-after` value
/// converted to milliseconds, or zero for an immediate retry when the header
/// is absent or unparseable.
pub(crate) fn retry_after_delay(retry_after_secs: Option<f64>) -> Duration {
    match retry_after_secs {
        Some(secs) if secs > 0.0 => Duration::from_millis((secs * 1_000.0) as u64),
        _ => Duration::ZERO,
    }
}

/// Delay before retrying a THROTTLED query: the time for the cost bucket to
/// restore enough points for the query plus headroom. Never negative; if the
/// bucket already has room the retry is immediate.
pub(crate) fn throttle_delay(status: &ThrottleStatus) -> Duration {
    if status.restore_rate <= 0.0 {
        return Duration::ZERO;
    }
    let deficit =
        status.requested_query_cost + THROTTLE_COST_HEADROOM - status.currently_available;
    if deficit <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_secs_f64(deficit / status.restore_rate)
}
