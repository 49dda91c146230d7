//! # shopify-graphql
//!
//! An async client for the Shopify GraphQL Admin API with cost-aware rate
//! limiting, response-driven retries, cursor pagination, and bulk operation
//! workflows.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shopify_graphql::{GraphqlClient, Session, ShopDomain};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::public(ShopDomain::new("my-store")?, "shpat_token");
//! let client = GraphqlClient::new(session);
//!
//! let result = client.execute("query { shop { name } }", None).await?;
//! println!("{:?}", result.data());
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - **Cost-aware limiting**: every call is gated by a sliding one-second
//!   cost window fed by the `actualQueryCost` the API reports, so clients
//!   slow themselves down before the server has to.
//! - **Response-driven retries**: retryable statuses honor `retry-after`,
//!   `THROTTLED` errors wait exactly as long as the cost bucket needs to
//!   restore, and transport errors back off exponentially - all within a
//!   single per-call retry budget.
//! - **Pagination**: [`GraphqlClient::paginate`] follows `endCursor` through
//!   a connection and returns the accumulated nodes.
//! - **Bulk operations**: submit queries and mutations as background jobs
//!   via [`GraphqlClient::bulk`], including staged JSONL uploads for
//!   mutations, and poll them to completion.
//! - **Hooks**: observe or veto requests with pre/post hooks registered on
//!   [`ClientOptions`](config::ClientOptions).
//!
//! ## Private apps
//!
//! Private apps authenticate with basic auth instead of an access token:
//!
//! ```rust,no_run
//! use shopify_graphql::{ApiKey, ApiSecretKey, GraphqlClient, Session, ShopDomain};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::private(
//!     ShopDomain::new("my-store")?,
//!     ApiKey::new("key")?,
//!     ApiSecretKey::new("password")?,
//! );
//! let client = GraphqlClient::new(session);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod clients;
pub mod config;
mod error;
pub mod limits;

pub use auth::{AccessMode, Credentials, Session};
pub use clients::bulk::{BulkOperation, BulkOperationKind, BulkOperationStatus, JsonlReader};
pub use clients::graphql::{
    BackoffPolicy, GraphqlClient, QueryField, QueryPayload, RequestResult, ShopifyQuery,
};
pub use clients::GraphqlError;
pub use config::{ApiKey, ApiSecretKey, ApiVersion, ClientOptions, ShopDomain};
pub use error::ConfigError;
