//! Errors returned by the GraphQL and bulk operation clients.

use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::clients::bulk::{BulkOperationKind, BulkOperationStatus};
use crate::clients::graphql::HookError;

/// Everything that can go wrong executing a GraphQL call or a bulk
/// operation.
///
/// Retry-related variants carry the number of retries consumed so callers
/// can tell a first-attempt failure from an exhausted retry budget.
#[derive(Debug, Error)]
pub enum GraphqlError {
    /// The request never produced an HTTP response, even after backoff
    /// retries.
    #[error("transport error after {retries} retries: {source}")]
    Transport {
        /// The underlying connection or protocol error.
        source: reqwest::Error,
        /// Retries consumed before giving up.
        retries: u32,
    },

    /// The shop is gone or frozen (HTTP 402/404). Never retried.
    #[error("shop unavailable (http {status}) at {url}")]
    ShopUnavailable {
        /// The status that signaled unavailability.
        status: u16,
        /// The endpoint that was called.
        url: String,
    },

    /// A retryable HTTP status persisted past the retry budget.
    #[error("http {status} persisted after {retries} of {max_retries} retries: {message}")]
    MaxRetriesExceeded {
        /// The final retryable status received.
        status: u16,
        /// The configured retry budget.
        max_retries: u32,
        /// Retries actually consumed.
        retries: u32,
        /// Body of the final response, for diagnostics.
        message: String,
    },

    /// The query stayed throttled past the retry budget.
    #[error("query throttled after {retries} retries")]
    Throttled {
        /// Retries consumed before giving up.
        retries: u32,
        /// The THROTTLED error payload from the final response.
        errors: Value,
    },

    /// The API returned GraphQL errors that are not retryable.
    #[error("graphql query failed: {errors}")]
    Query {
        /// The top-level error payload.
        errors: Value,
    },

    /// A bulk operation of this kind is already in flight; Shopify allows
    /// one per kind per shop.
    #[error("a {kind} bulk operation is already running")]
    BulkOperationInProgress {
        /// The kind that is occupied.
        kind: BulkOperationKind,
    },

    /// Polling found no current operation, or a different operation than
    /// the one submitted.
    #[error("bulk operation {job_id} not found")]
    JobNotFound {
        /// The id being polled for.
        job_id: String,
    },

    /// The bulk operation reached a terminal state other than `COMPLETED`.
    #[error("bulk operation {job_id} ended as {status}")]
    JobFailed {
        /// The id of the failed operation.
        job_id: String,
        /// The terminal status observed.
        status: BulkOperationStatus,
        /// The `errorCode` reported by the API, if any.
        error_code: Option<String>,
        /// The raw `currentBulkOperation` node, for diagnostics.
        payload: Value,
    },

    /// Polling ran past the configured deadline while the operation was
    /// still active.
    #[error("bulk operation still running after {0:?}")]
    PollDeadlineExceeded(Duration),

    /// A pre- or post-request hook returned an error.
    #[error("request hook failed: {source}")]
    Hook {
        /// The error the hook returned.
        source: HookError,
    },
}
