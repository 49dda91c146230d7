//! JSONL encoding and decoding for bulk operation payloads and results.

use serde_json::Value;

/// Encodes rows as JSONL, one compact JSON document per line.
///
/// With `wrap_key` set, each row is wrapped in an object under that key -
/// the shape `bulkOperationRunMutation` expects when the mutation takes a
/// single named input variable:
///
/// ```rust
/// use serde_json::json;
/// use shopify_graphql::clients::bulk::encode_jsonl;
///
/// let rows = vec![json!({"title": "Shirt"}), json!({"title": "Hat"})];
/// let jsonl = encode_jsonl(&rows, Some("input"));
/// assert_eq!(jsonl, "{\"input\":{\"title\":\"Shirt\"}}\n{\"input\":{\"title\":\"Hat\"}}\n");
/// ```
#[must_use]
pub fn encode_jsonl(rows: &[Value], wrap_key: Option<&str>) -> String {
    let mut out = String::new();
    for row in rows {
        let line = match wrap_key {
            Some(key) => serde_json::json!({ key: row }).to_string(),
            None => row.to_string(),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Downloaded bulk operation results, decoded line by line.
///
/// A completed operation with no results (the API reports a null download
/// URL) decodes as an empty reader.
#[derive(Clone, Debug, Default)]
pub struct JsonlReader {
    content: String,
}

impl JsonlReader {
    /// Wraps downloaded JSONL text.
    #[must_use]
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// An empty result set.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether the result set contains no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines().next().is_none()
    }

    /// The raw JSONL text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Iterates over non-empty lines.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
    }

    /// Parses every line as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns the underlying parse error if any line is not valid JSON.
    pub fn records(&self) -> Result<Vec<Value>, serde_json::Error> {
        self.lines().map(serde_json::from_str).collect()
    }
}
