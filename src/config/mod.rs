//! Client configuration: validated newtypes, API versions, and the options
//! bundle controlling retries, cost limiting, and polling.

mod newtypes;
mod version;

pub use newtypes::{ApiKey, ApiSecretKey, ShopDomain};
pub use version::ApiVersion;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::clients::graphql::{BackoffPolicy, RequestHook};
use crate::limits::{Deferrer, SleepDeferrer};

/// Default retry budget per call.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Default proactive cost budget per one-second window, in query cost
/// points.
pub const DEFAULT_COST_BUDGET: u32 = 50;

/// HTTP statuses retried by default.
pub const DEFAULT_RETRY_STATUS: [u16; 4] = [429, 502, 503, 504];

/// HTTP statuses that mean the shop itself is unavailable and retrying is
/// pointless.
pub const DEFAULT_SHOP_UNAVAILABLE_STATUS: [u16; 2] = [402, 404];

/// Tunables for a [`GraphqlClient`](crate::clients::graphql::GraphqlClient).
///
/// Built once via [`ClientOptions::builder`] and owned by the client for its
/// lifetime. Every knob has a production-ready default, so
/// `ClientOptions::default()` works out of the box.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use shopify_graphql::config::{ApiVersion, ClientOptions};
///
/// let options = ClientOptions::builder()
///     .api_version(ApiVersion::V2025_07)
///     .max_retries(3)
///     .cost_budget_per_second(100)
///     .poll_deadline(Duration::from_secs(600))
///     .build();
/// assert_eq!(options.max_retries(), 3);
/// ```
pub struct ClientOptions {
    max_retries: u32,
    retry_on_status: Vec<u16>,
    shop_unavailable_status: Vec<u16>,
    default_headers: HashMap<String, String>,
    api_version: ApiVersion,
    endpoint: Option<String>,
    cost_budget_per_second: u32,
    backoff: BackoffPolicy,
    request_timeout: Duration,
    poll_interval: Duration,
    poll_deadline: Option<Duration>,
    pre_request_hooks: Vec<Box<dyn RequestHook>>,
    post_request_hooks: Vec<Box<dyn RequestHook>>,
    deferrer: Arc<dyn Deferrer>,
}

impl ClientOptions {
    /// Starts building options from the defaults.
    #[must_use]
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::new()
    }

    /// Retry budget shared by every retry class within a single call.
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// HTTP statuses that trigger a retry.
    #[must_use]
    pub fn retry_on_status(&self) -> &[u16] {
        &self.retry_on_status
    }

    /// HTTP statuses that fail immediately as shop-unavailable.
    #[must_use]
    pub fn shop_unavailable_status(&self) -> &[u16] {
        &self.shop_unavailable_status
    }

    /// Headers attached to every request.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// The Admin API version requests target.
    #[must_use]
    pub const fn api_version(&self) -> &ApiVersion {
        &self.api_version
    }

    /// Explicit endpoint URL overriding the one derived from the session's
    /// shop domain. Used to route through a proxy or a mock server.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Query cost points the client will spend per second before delaying
    /// outgoing calls.
    #[must_use]
    pub const fn cost_budget_per_second(&self) -> u32 {
        self.cost_budget_per_second
    }

    /// Backoff policy for transport errors.
    #[must_use]
    pub const fn backoff(&self) -> &BackoffPolicy {
        &self.backoff
    }

    /// Per-request HTTP timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Sleep between bulk operation status polls.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Optional upper bound on total bulk polling time. `None` polls until
    /// the operation reaches a terminal state.
    #[must_use]
    pub const fn poll_deadline(&self) -> Option<Duration> {
        self.poll_deadline
    }

    /// Hooks invoked before each request is sent.
    #[must_use]
    pub fn pre_request_hooks(&self) -> &[Box<dyn RequestHook>] {
        &self.pre_request_hooks
    }

    /// Hooks invoked after each successful request.
    #[must_use]
    pub fn post_request_hooks(&self) -> &[Box<dyn RequestHook>] {
        &self.post_request_hooks
    }

    /// The clock and sleep implementation used for all waiting.
    #[must_use]
    pub fn deferrer(&self) -> &Arc<dyn Deferrer> {
        &self.deferrer
    }
}

impl Default for ClientOptions {
    fn default() -> Self {
        ClientOptionsBuilder::new().build()
    }
}

// Hooks and the deferrer are not Debug, so summarize them.
impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("max_retries", &self.max_retries)
            .field("retry_on_status", &self.retry_on_status)
            .field("shop_unavailable_status", &self.shop_unavailable_status)
            .field("default_headers", &self.default_headers)
            .field("api_version", &self.api_version)
            .field("endpoint", &self.endpoint)
            .field("cost_budget_per_second", &self.cost_budget_per_second)
            .field("backoff", &self.backoff)
            .field("request_timeout", &self.request_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("poll_deadline", &self.poll_deadline)
            .field("pre_request_hooks", &self.pre_request_hooks.len())
            .field("post_request_hooks", &self.post_request_hooks.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ClientOptions`]. Every setter is infallible; `build` never
/// fails.
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    fn new() -> Self {
        let mut default_headers = HashMap::new();
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());
        default_headers.insert("Accept".to_string(), "application/json".to_string());

        Self {
            options: ClientOptions {
                max_retries: DEFAULT_MAX_RETRIES,
                retry_on_status: DEFAULT_RETRY_STATUS.to_vec(),
                shop_unavailable_status: DEFAULT_SHOP_UNAVAILABLE_STATUS.to_vec(),
                default_headers,
                api_version: ApiVersion::default(),
                endpoint: None,
                cost_budget_per_second: DEFAULT_COST_BUDGET,
                backoff: BackoffPolicy::default(),
                request_timeout: Duration::from_secs(5),
                poll_interval: Duration::from_secs(1),
                poll_deadline: None,
                pre_request_hooks: Vec::new(),
                post_request_hooks: Vec::new(),
                deferrer: Arc::new(SleepDeferrer),
            },
        }
    }

    /// Sets the retry budget per call.
    #[must_use]
    pub const fn max_retries(mut self, max_retries: u32) -> Self {
        self.options.max_retries = max_retries;
        self
    }

    /// Replaces the set of retryable HTTP statuses.
    #[must_use]
    pub fn retry_on_status(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.options.retry_on_status = statuses.into();
        self
    }

    /// Replaces the set of shop-unavailable HTTP statuses.
    #[must_use]
    pub fn shop_unavailable_status(mut self, statuses: impl Into<Vec<u16>>) -> Self {
        self.options.shop_unavailable_status = statuses.into();
        self
    }

    /// Adds a header sent with every request.
    #[must_use]
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options
            .default_headers
            .insert(name.into(), value.into());
        self
    }

    /// Targets a specific Admin API version.
    #[must_use]
    pub fn api_version(mut self, api_version: ApiVersion) -> Self {
        self.options.api_version = api_version;
        self
    }

    /// Routes all GraphQL calls to an explicit endpoint URL instead of the
    /// one derived from the shop domain.
    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.options.endpoint = Some(endpoint.into());
        self
    }

    /// Sets the proactive cost budget per second.
    #[must_use]
    pub const fn cost_budget_per_second(mut self, budget: u32) -> Self {
        self.options.cost_budget_per_second = budget;
        self
    }

    /// Sets the transport-error backoff policy.
    #[must_use]
    pub const fn backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.options.backoff = backoff;
        self
    }

    /// Sets the per-request HTTP timeout.
    #[must_use]
    pub const fn request_timeout(mut self, timeout: Duration) -> Self {
        self.options.request_timeout = timeout;
        self
    }

    /// Sets the sleep between bulk status polls.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.options.poll_interval = interval;
        self
    }

    /// Bounds total bulk polling time.
    #[must_use]
    pub const fn poll_deadline(mut self, deadline: Duration) -> Self {
        self.options.poll_deadline = Some(deadline);
        self
    }

    /// Registers a hook invoked before every request.
    #[must_use]
    pub fn pre_request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.options.pre_request_hooks.push(Box::new(hook));
        self
    }

    /// Registers a hook invoked after every successful request.
    #[must_use]
    pub fn post_request_hook(mut self, hook: impl RequestHook + 'static) -> Self {
        self.options.post_request_hooks.push(Box::new(hook));
        self
    }

    /// Swaps in a custom clock/sleep implementation. Tests use this to run
    /// the retry and polling paths without real waiting.
    #[must_use]
    pub fn deferrer(mut self, deferrer: Arc<dyn Deferrer>) -> Self {
        self.options.deferrer = deferrer;
        self
    }

    /// Finishes the build.
    #[must_use]
    pub fn build(self) -> ClientOptions {
        self.options
    }
}

// Verify ClientOptions is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientOptions>();
};
