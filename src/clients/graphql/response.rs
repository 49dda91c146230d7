//! Parsed GraphQL responses and body classification helpers.

use serde_json::Value;

/// The outcome of a successful GraphQL call.
///
/// By the time a `RequestResult` is returned the response was a 2xx, parsed
/// as JSON, and carried no top-level `errors`; error-shaped responses surface
/// as [`GraphqlError`](crate::clients::errors::GraphqlError) variants instead.
/// `body` and `errors` are mutually exclusive by construction.
#[derive(Clone, Debug)]
pub struct RequestResult {
    /// HTTP status of the final response.
    pub status: u16,
    /// Parsed response body. Always present on results returned by the
    /// client.
    pub body: Option<Value>,
    /// Top-level GraphQL errors. Never set alongside `body`.
    pub errors: Option<Value>,
    /// How many retries the call consumed before succeeding.
    pub retries: u32,
}

impl RequestResult {
    pub(crate) const fn success(status: u16, body: Value, retries: u32) -> Self {
        Self {
            status,
            body: Some(body),
            errors: None,
            retries,
        }
    }

    #[cfg(test)]
    pub(crate) const fn failure(status: u16, errors: Value, retries: u32) -> Self {
        Self {
            status,
            body: None,
            errors: Some(errors),
            retries,
        }
    }

    /// Returns the `data` object of the response, if present.
    #[must_use]
    pub fn data(&self) -> Option<&Value> {
        self.body.as_ref()?.get("data")
    }

    /// Returns the actual query cost reported under
    /// `extensions.cost.actualQueryCost`, if the API included it.
    #[must_use]
    pub fn actual_query_cost(&self) -> Option<u32> {
        self.body.as_ref().and_then(actual_query_cost)
    }
}

/// Returns the error payload of a parsed body: the top-level `errors` value,
/// or the `error` value some endpoints use, skipping nulls and empty arrays.
pub(crate) fn error_payload(body: &Value) -> Option<&Value> {
    let payload = body.get("errors").or_else(|| body.get("error"))?;
    match payload {
        Value::Null => None,
        Value::Array(items) if items.is_empty() => None,
        _ => Some(payload),
    }
}

/// Collects `extensions.code` values from every entry in the error payload.
/// Shopify signals throttling with the code `THROTTLED` here rather than an
/// HTTP 429.
pub(crate) fn error_codes(body: &Value) -> Vec<String> {
    let Some(payload) = error_payload(body) else {
        return Vec::new();
    };
    let entries: Vec<&Value> = match payload {
        Value::Array(items) => items.iter().collect(),
        other => vec![other],
    };
    entries
        .iter()
        .filter_map(|entry| entry.get("extensions")?.get("code")?.as_str())
        .map(str::to_string)
        .collect()
}

pub(crate) fn actual_query_cost(body: &Value) -> Option<u32> {
    let cost = body.get("extensions")?.get("cost")?.get("actualQueryCost")?;
    u32::try_from(cost.as_u64()?).ok()
}

/// Throttle state reported under `extensions.cost` on a THROTTLED response.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ThrottleStatus {
    pub requested_query_cost: f64,
    pub currently_available: f64,
    pub restore_rate: f64,
}

pub(crate) fn throttle_status(body: &Value) -> Option<ThrottleStatus> {
    let cost = body.get("extensions")?.get("cost")?;
    let throttle = cost.get("throttleStatus")?;
    Some(ThrottleStatus {
        requested_query_cost: cost.get("requestedQueryCost")?.as_f64()?,
        currently_available: throttle.get("currentlyAvailable")?.as_f64()?,
        restore_rate: throttle.get("restoreRate")?.as_f64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_data_accessor() {
        let result = RequestResult::success(200, json!({"data": {"shop": {"name": "x"}}}), 0);
        assert_eq!(result.data().unwrap()["shop"]["name"], "x");
        assert!(result.errors.is_none());
    }

    #[test]
    fn test_failure_excludes_body() {
        let result = RequestResult::failure(200, json!([{"message": "bad"}]), 1);
        assert!(result.body.is_none());
        assert!(result.data().is_none());
        assert!(result.errors.is_some());
    }

    #[test]
    fn test_error_payload_skips_null_and_empty() {
        assert!(error_payload(&json!({"data": {}})).is_none());
        assert!(error_payload(&json!({"errors": null})).is_none());
        assert!(error_payload(&json!({"errors": []})).is_none());
        assert!(error_payload(&json!({"errors": [{"message": "x"}]})).is_some());
        assert!(error_payload(&json!({"error": "not found"})).is_some());
    }

    #[test]
    fn test_error_codes_extraction() {
        let body = json!({
            "errors": [
                {"message": "Throttled", "extensions": {"code": "THROTTLED"}},
                {"message": "other"},
            ]
        });
        assert_eq!(error_codes(&body), vec!["THROTTLED"]);

        let no_codes = json!({"errors": [{"message": "plain"}]});
        assert!(error_codes(&no_codes).is_empty());
    }

    #[test]
    fn test_actual_query_cost() {
        let body = json!({
            "data": {},
            "extensions": {"cost": {"actualQueryCost": 42}}
        });
        assert_eq!(actual_query_cost(&body), Some(42));
        assert_eq!(actual_query_cost(&json!({"data": {}})), None);
    }

    #[test]
    fn test_throttle_status_parsing() {
        let body = json!({
            "extensions": {
                "cost": {
                    "requestedQueryCost": 1000,
                    "actualQueryCost": null,
                    "throttleStatus": {
                        "maximumAvailable": 1000.0,
                        "currentlyAvailable": 250.0,
                        "restoreRate": 50.0
                    }
                }
            }
        });
        let status = throttle_status(&body).unwrap();
        assert!((status.requested_query_cost - 1000.0).abs() < f64::EPSILON);
        assert!((status.currently_available - 250.0).abs() < f64::EPSILON);
        assert!((status.restore_rate - 50.0).abs() < f64::EPSILON);
    }
}
