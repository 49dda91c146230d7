//! Bulk operation records as reported by `currentBulkOperation`.

use std::fmt;

use serde::{Deserialize, Deserializer};

/// Which kind of bulk operation to target. Shopify tracks one current
/// operation per kind per shop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkOperationKind {
    /// A `bulkOperationRunQuery` job.
    Query,
    /// A `bulkOperationRunMutation` job.
    Mutation,
}

impl BulkOperationKind {
    /// The enum value used in the `currentBulkOperation(type:)` argument.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Query => "QUERY",
            Self::Mutation => "MUTATION",
        }
    }
}

impl fmt::Display for BulkOperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle states of a bulk operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BulkOperationStatus {
    /// Accepted but not yet running.
    Created,
    /// Executing.
    Running,
    /// Finished successfully; results may be available at `url`.
    Completed,
    /// Cancellation requested, still winding down.
    Canceling,
    /// Canceled before completion.
    Canceled,
    /// Failed; see `errorCode`.
    Failed,
    /// Expired before it could run.
    Expired,
}

impl BulkOperationStatus {
    /// Whether the operation is still in flight. `CREATED` and `RUNNING`
    /// both block submitting a new operation of the same kind.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Created | Self::Running)
    }
}

impl fmt::Display for BulkOperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Canceling => "CANCELING",
            Self::Canceled => "CANCELED",
            Self::Failed => "FAILED",
            Self::Expired => "EXPIRED",
        };
        f.write_str(label)
    }
}

/// A snapshot of a bulk operation from `currentBulkOperation`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    /// The operation's GID, e.g. `gid://shopify/BulkOperation/123`.
    pub id: String,
    /// Current lifecycle state.
    pub status: BulkOperationStatus,
    /// Failure code when `status` is `FAILED`.
    #[serde(default)]
    pub error_code: Option<String>,
    /// Objects processed so far. The API serializes this count as a string.
    #[serde(default, deserialize_with = "u64_from_string_or_number")]
    pub object_count: Option<u64>,
    /// Download URL for the JSONL results, once completed. Null when the
    /// operation produced no results.
    #[serde(default)]
    pub url: Option<String>,
    /// Download URL for partial results of a failed operation.
    #[serde(default)]
    pub partial_data_url: Option<String>,
}

// UnsignedInt64 fields arrive as JSON strings; accept numbers too.
fn u64_from_string_or_number<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(count)) => Ok(Some(count)),
        Some(Raw::Text(text)) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
