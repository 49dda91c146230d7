//! Pre/post request hooks.
//!
//! Hooks are registered on [`ClientOptions`](crate::config::ClientOptions) at
//! construction time and invoked synchronously, in registration order, around
//! every GraphQL call. A failing pre-request hook aborts the call before
//! anything is sent; a failing post-request hook surfaces after the response
//! was already received.

use serde_json::Value;

use crate::clients::graphql::response::RequestResult;

/// Error type hooks may return; wrapped into
/// [`GraphqlError::Hook`](crate::clients::errors::GraphqlError::Hook).
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// The point in the request pipeline a hook is observing.
#[derive(Debug)]
pub enum HookContext<'a> {
    /// About to send a request.
    BeforeRequest {
        /// The rendered query string.
        query: &'a str,
        /// Variables for the query, if any.
        variables: Option<&'a Value>,
    },
    /// A request completed successfully.
    AfterRequest {
        /// The parsed result.
        result: &'a RequestResult,
    },
}

/// A callback invoked around GraphQL calls.
///
/// Closures with the matching signature implement this trait, so simple
/// logging hooks need no dedicated type:
///
/// ```rust
/// use shopify_graphql::clients::graphql::{HookContext, HookError, RequestHook};
///
/// let hook = |context: &HookContext<'_>| -> Result<(), HookError> {
///     if let HookContext::BeforeRequest { query, .. } = context {
///         tracing::debug!(%query, "sending GraphQL request");
///     }
///     Ok(())
/// };
/// let _boxed: Box<dyn RequestHook> = Box::new(hook);
/// ```
pub trait RequestHook: Send + Sync {
    /// Invokes the hook. Errors propagate and abort the call.
    fn invoke(&self, context: &HookContext<'_>) -> Result<(), HookError>;
}

impl<F> RequestHook for F
where
    F: Fn(&HookContext<'_>) -> Result<(), HookError> + Send + Sync,
{
    fn invoke(&self, context: &HookContext<'_>) -> Result<(), HookError> {
        self(context)
    }
}
