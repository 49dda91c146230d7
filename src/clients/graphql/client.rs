//! The GraphQL Admin API client.

use std::collections::HashMap;

use serde_json::{json, Map, Value};

use crate::auth::{Credentials, Session};
use crate::clients::bulk::BulkOperations;
use crate::clients::errors::GraphqlError;
use crate::clients::graphql::hooks::HookContext;
use crate::clients::graphql::query::QueryPayload;
use crate::clients::graphql::response::{self, RequestResult};
use crate::clients::graphql::retry;
use crate::config::ClientOptions;
use crate::limits::CostLimiter;

/// Header carrying the access token for public apps.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

/// A client for the Shopify GraphQL Admin API.
///
/// Every call runs through the same pipeline: the proactive cost limiter may
/// delay the send, pre-request hooks run, the request goes out with the
/// session's credentials, and the response is classified - retryable
/// statuses and `THROTTLED` errors are retried with server-hinted delays,
/// transport errors with exponential backoff, everything else resolves to a
/// [`RequestResult`] or a [`GraphqlError`].
///
/// # Example
///
/// ```rust,no_run
/// use shopify_graphql::{GraphqlClient, Session, ShopDomain};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let session = Session::public(ShopDomain::new("my-store")?, "shpat_token");
/// let client = GraphqlClient::new(session);
///
/// let result = client
///     .execute("query { shop { name } }", None)
///     .await?;
/// println!("{:?}", result.data());
/// # Ok(())
/// # }
/// ```
///
/// # Thread Safety
///
/// The client is `Send + Sync`; share one instance across tasks so they all
/// draw from the same cost budget.
pub struct GraphqlClient {
    http: reqwest::Client,
    session: Session,
    options: ClientOptions,
    limiter: CostLimiter,
    endpoint: String,
}

impl GraphqlClient {
    /// Creates a client with default [`ClientOptions`].
    #[must_use]
    pub fn new(session: Session) -> Self {
        Self::with_options(session, ClientOptions::default())
    }

    /// Creates a client with explicit options.
    ///
    /// # Panics
    ///
    /// Panics if the TLS backend cannot be initialized.
    #[must_use]
    pub fn with_options(session: Session, options: ClientOptions) -> Self {
        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .timeout(options.request_timeout())
            .build()
            .expect("Failed to create HTTP client");
        let endpoint = options.endpoint().map_or_else(
            || session.graphql_endpoint(options.api_version()),
            str::to_string,
        );
        let limiter = CostLimiter::new(options.cost_budget_per_second());

        Self {
            http,
            session,
            options,
            limiter,
            endpoint,
        }
    }

    /// The session this client authenticates with.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// The options this client was built with.
    #[must_use]
    pub const fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// The resolved GraphQL endpoint URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) const fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Returns a bulk operations handle backed by this client.
    #[must_use]
    pub fn bulk(&self) -> BulkOperations<'_> {
        BulkOperations::new(self)
    }

    /// Executes a GraphQL query or mutation.
    ///
    /// # Errors
    ///
    /// Returns a [`GraphqlError`] when the call fails after exhausting its
    /// retry budget, the shop is unavailable, the response carries GraphQL
    /// errors, or a hook fails.
    pub async fn execute(
        &self,
        query: impl Into<QueryPayload>,
        variables: Option<Value>,
    ) -> Result<RequestResult, GraphqlError> {
        self.execute_with_headers(query, variables, None).await
    }

    /// Executes a call with extra per-request headers layered over the
    /// defaults.
    ///
    /// # Errors
    ///
    /// Same failure modes as [`execute`](Self::execute).
    pub async fn execute_with_headers(
        &self,
        query: impl Into<QueryPayload>,
        variables: Option<Value>,
        headers: Option<HashMap<String, String>>,
    ) -> Result<RequestResult, GraphqlError> {
        let rendered = query.into().render();
        let deferrer = self.options.deferrer();
        let mut retries: u32 = 0;

        loop {
            if let Some(delay) = self.limiter.check(deferrer.now_ms()) {
                tracing::debug!(delay_ms = delay.as_millis() as u64, "cost budget spent, delaying request");
                deferrer.sleep(delay).await;
            }

            let before = HookContext::BeforeRequest {
                query: &rendered,
                variables: variables.as_ref(),
            };
            for hook in self.options.pre_request_hooks() {
                hook.invoke(&before)
                    .map_err(|source| GraphqlError::Hook { source })?;
            }

            let response = match self.send(&rendered, variables.as_ref(), headers.as_ref()).await
            {
                Ok(response) => response,
                Err(source) => {
                    if retries >= self.options.max_retries() {
                        return Err(GraphqlError::Transport { source, retries });
                    }
                    retries += 1;
                    let delay = self.options.backoff().delay(retries);
                    tracing::warn!(
                        error = %source,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        "transport error, backing off"
                    );
                    deferrer.sleep(delay).await;
                    continue;
                }
            };

            let status = response.status().as_u16();

            if self.options.shop_unavailable_status().contains(&status) {
                tracing::error!(status, url = %self.endpoint, "shop unavailable");
                return Err(GraphqlError::ShopUnavailable {
                    status,
                    url: self.endpoint.clone(),
                });
            }

            if self.options.retry_on_status().contains(&status) {
                let retry_after = retry::parse_retry_after(response.headers());
                if retries >= self.options.max_retries() {
                    let message = response.text().await.unwrap_or_default();
                    return Err(GraphqlError::MaxRetriesExceeded {
                        status,
                        max_retries: self.options.max_retries(),
                        retries,
                        message,
                    });
                }
                retries += 1;
                let delay = retry::retry_after_delay(retry_after);
                tracing::warn!(
                    status,
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    "retryable status, waiting before retry"
                );
                deferrer.sleep(delay).await;
                continue;
            }

            let text = response
                .text()
                .await
                .map_err(|source| GraphqlError::Transport { source, retries })?;
            let body: Value = match serde_json::from_str(&text) {
                Ok(body) => body,
                Err(error) => {
                    return Err(GraphqlError::Query {
                        errors: json!({
                            "message": format!("response body is not valid JSON: {error}"),
                            "body": text,
                        }),
                    });
                }
            };

            if response::error_codes(&body).iter().any(|code| code == "THROTTLED") {
                let errors = response::error_payload(&body)
                    .cloned()
                    .unwrap_or(Value::Null);
                if retries >= self.options.max_retries() {
                    return Err(GraphqlError::Throttled { retries, errors });
                }
                retries += 1;
                let delay = response::throttle_status(&body)
                    .map_or_else(|| self.options.backoff().delay(retries), |throttle| retry::throttle_delay(&throttle));
                tracing::warn!(
                    retry = retries,
                    delay_ms = delay.as_millis() as u64,
                    "query throttled, waiting for cost bucket to restore"
                );
                deferrer.sleep(delay).await;
                continue;
            }

            if let Some(errors) = response::error_payload(&body) {
                return Err(GraphqlError::Query {
                    errors: errors.clone(),
                });
            }

            if let Some(cost) = response::actual_query_cost(&body) {
                self.limiter.record(deferrer.now_ms(), cost);
            }

            let result = RequestResult::success(status, body, retries);
            let after = HookContext::AfterRequest { result: &result };
            for hook in self.options.post_request_hooks() {
                hook.invoke(&after)
                    .map_err(|source| GraphqlError::Hook { source })?;
            }
            return Ok(result);
        }
    }

    async fn send(
        &self,
        query: &str,
        variables: Option<&Value>,
        headers: Option<&HashMap<String, String>>,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let body = json!({
            "query": query,
            "variables": variables,
        });

        let mut builder = self.http.post(&self.endpoint);
        for (name, value) in self.options.default_headers() {
            builder = builder.header(name, value);
        }
        builder = builder.json(&body);
        builder = match self.session.credentials() {
            Credentials::AccessToken(token) => builder.header(ACCESS_TOKEN_HEADER, token),
            Credentials::Basic { key, password } => {
                builder.basic_auth(key.as_ref(), Some(password.as_ref()))
            }
        };
        if let Some(extra) = headers {
            for (name, value) in extra {
                builder = builder.header(name, value);
            }
        }

        builder.send().await
    }

    /// Walks a paginated connection, following `endCursor` until the last
    /// page, and returns the accumulated nodes.
    ///
    /// The query must declare a `$cursor` variable and pass it as the
    /// connection's `after` argument; the walker injects the `cursor`
    /// variable between pages. The first connection-shaped field found in
    /// the response (an object with `edges` or `nodes`, one nesting level
    /// deep at most) is the one walked.
    ///
    /// `max_limit` caps the total nodes collected; once reached the result
    /// is truncated and no further pages are fetched.
    ///
    /// # Errors
    ///
    /// Propagates any [`GraphqlError`] from the underlying calls.
    pub async fn paginate(
        &self,
        query: impl Into<QueryPayload>,
        variables: Option<Value>,
        max_limit: Option<usize>,
    ) -> Result<Vec<Value>, GraphqlError> {
        let payload = query.into();
        let base_variables = match variables {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        let mut nodes = Vec::new();
        let mut cursor: Option<String> = None;
        let mut pages: u32 = 0;

        loop {
            let mut page_variables = base_variables.clone();
            if let Some(cursor) = &cursor {
                page_variables.insert("cursor".to_string(), Value::String(cursor.clone()));
            }

            let result = self
                .execute(payload.clone(), Some(Value::Object(page_variables)))
                .await?;
            pages += 1;
            cursor = None;

            if let Some(connection) = result.data().and_then(find_connection) {
                if let Some(edges) = connection.get("edges").and_then(Value::as_array) {
                    nodes.extend(edges.iter().filter_map(|edge| edge.get("node")).cloned());
                } else if let Some(plain) = connection.get("nodes").and_then(Value::as_array) {
                    nodes.extend(plain.iter().cloned());
                }
                cursor = next_cursor(connection);
            }

            if let Some(limit) = max_limit {
                if nodes.len() >= limit {
                    nodes.truncate(limit);
                    break;
                }
            }
            if cursor.is_none() {
                break;
            }
        }

        tracing::debug!(pages, nodes = nodes.len(), "pagination complete");
        Ok(nodes)
    }
}

/// Finds the first connection-shaped value in a `data` object: either a
/// top-level field with `edges`/`nodes`, or a child of a top-level field
/// that carries `pageInfo` (the shape of queries nested one entity deep).
fn find_connection(data: &Value) -> Option<&Value> {
    let fields = data.as_object()?;
    for value in fields.values() {
        let Some(field) = value.as_object() else {
            continue;
        };
        let candidate = field
            .values()
            .find(|child| {
                child
                    .as_object()
                    .is_some_and(|child| child.contains_key("pageInfo"))
            })
            .unwrap_or(value);
        if let Some(candidate_fields) = candidate.as_object() {
            if candidate_fields.contains_key("edges") || candidate_fields.contains_key("nodes") {
                return Some(candidate);
            }
        }
    }
    None
}

/// Returns the cursor for the next page, if `pageInfo` says there is one.
fn next_cursor(connection: &Value) -> Option<String> {
    let page_info = connection.get("pageInfo")?;
    if page_info.get("hasNextPage")?.as_bool()? {
        Some(page_info.get("endCursor")?.as_str()?.to_string())
    } else {
        None
    }
}

// Verify GraphqlClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<GraphqlClient>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_connection_takes_first_field_in_key_order() {
        // serde_json objects iterate in key order, so `orders` wins.
        let data = json!({
            "products": {
                "edges": [{"node": {"id": 1}}],
                "pageInfo": {"hasNextPage": false, "endCursor": null}
            },
            "orders": {
                "edges": [{"node": {"id": 2}}],
                "pageInfo": {"hasNextPage": true, "endCursor": "x"}
            }
        });
        let connection = find_connection(&data).unwrap();
        assert_eq!(connection["edges"][0]["node"]["id"], 2);
    }

    #[test]
    fn test_find_connection_descends_into_page_info_child() {
        let data = json!({
            "product": {
                "id": "gid://shopify/Product/1",
                "variants": {
                    "nodes": [{"sku": "A"}],
                    "pageInfo": {"hasNextPage": false, "endCursor": null}
                }
            }
        });
        let connection = find_connection(&data).unwrap();
        assert_eq!(connection["nodes"][0]["sku"], "A");
    }

    #[test]
    fn test_find_connection_ignores_scalar_fields() {
        let data = json!({"shop": {"name": "test"}});
        assert!(find_connection(&data).is_none());
    }

    #[test]
    fn test_next_cursor() {
        let connection = json!({
            "pageInfo": {"hasNextPage": true, "endCursor": "abc"}
        });
        assert_eq!(next_cursor(&connection), Some("abc".to_string()));

        let last_page = json!({
            "pageInfo": {"hasNextPage": false, "endCursor": "abc"}
        });
        assert_eq!(next_cursor(&last_page), None);

        assert_eq!(next_cursor(&json!({"edges": []})), None);
    }
}
