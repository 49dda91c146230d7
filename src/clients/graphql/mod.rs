//! The GraphQL client: request pipeline, retries, hooks, pagination, and the
//! typed query builder.

mod client;
mod hooks;
mod query;
mod response;
mod retry;

pub use client::GraphqlClient;
pub use hooks::{HookContext, HookError, RequestHook};
pub use query::{string_literal, QueryField, QueryPayload, ShopifyQuery};
pub use response::RequestResult;
pub use retry::BackoffPolicy;
