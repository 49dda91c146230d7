//! Query inputs: raw strings and the small typed query builder.

use serde_json::Value;
use std::fmt;

/// What the client accepts as a query: a raw GraphQL string or a
/// [`ShopifyQuery`] built with the typed builder.
///
/// Both [`GraphqlClient::execute`](crate::clients::graphql::GraphqlClient::execute)
/// and the pagination walker take `impl Into<QueryPayload>`, so `&str`,
/// `String`, and `ShopifyQuery` all work directly.
#[derive(Clone, Debug)]
pub enum QueryPayload {
    /// A raw GraphQL document, sent as-is.
    Raw(String),
    /// A query assembled with [`ShopifyQuery`], rendered on send.
    Built(ShopifyQuery),
}

impl QueryPayload {
    /// Renders the payload to the GraphQL document that goes on the wire.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Raw(query) => query.clone(),
            Self::Built(query) => query.render(),
        }
    }

    /// Renders just the selection on the root entity, without the operation
    /// wrapper. Used when embedding a query inside `bulkOperationRunQuery`,
    /// which supplies its own outer braces.
    #[must_use]
    pub fn render_selection(&self) -> String {
        match self {
            Self::Raw(query) => query.clone(),
            Self::Built(query) => query.render_selection(),
        }
    }
}

impl From<&str> for QueryPayload {
    fn from(query: &str) -> Self {
        Self::Raw(query.to_string())
    }
}

impl From<String> for QueryPayload {
    fn from(query: String) -> Self {
        Self::Raw(query)
    }
}

impl From<ShopifyQuery> for QueryPayload {
    fn from(query: ShopifyQuery) -> Self {
        Self::Built(query)
    }
}

impl From<&ShopifyQuery> for QueryPayload {
    fn from(query: &ShopifyQuery) -> Self {
        Self::Built(query.clone())
    }
}

/// GraphQL operation type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OperationType {
    Query,
    Mutation,
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Query => write!(f, "query"),
            Self::Mutation => write!(f, "mutation"),
        }
    }
}

/// A field selection inside a [`ShopifyQuery`]: a name, optional arguments,
/// and optional subfields.
#[derive(Clone, Debug)]
pub struct QueryField {
    name: String,
    arguments: Vec<(String, String)>,
    fields: Vec<QueryField>,
}

impl QueryField {
    /// Creates a leaf field with the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Adds an argument. The value is rendered verbatim, so string literals
    /// need their own quotes: `.argument("query", "\"status:open\"")`.
    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    /// Adds a leaf subfield by name.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Self::new(name));
        self
    }

    /// Adds a nested subfield with its own selection.
    #[must_use]
    pub fn nested(mut self, field: Self) -> Self {
        self.fields.push(field);
        self
    }

    fn render(&self) -> String {
        let mut out = self.name.clone();
        if !self.arguments.is_empty() {
            out.push('(');
            out.push_str(&render_arguments(&self.arguments));
            out.push(')');
        }
        if !self.fields.is_empty() {
            out.push_str(" { ");
            out.push_str(&render_fields(&self.fields));
            out.push_str(" }");
        }
        out
    }
}

fn render_arguments(arguments: &[(String, String)]) -> String {
    arguments
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join(", ")
}

fn render_fields(fields: &[QueryField]) -> String {
    fields
        .iter()
        .map(QueryField::render)
        .collect::<Vec<_>>()
        .join(" ")
}

/// A typed builder for Admin API queries and mutations.
///
/// Selections on connection entities are wrapped in `edges { node { ... } }`
/// and get a `pageInfo { hasNextPage endCursor }` block, which is the shape
/// [`paginate`](crate::clients::graphql::GraphqlClient::paginate) walks.
/// Connection wrapping defaults on for plural entity names and can be
/// overridden with [`connection`](Self::connection).
///
/// # Example
///
/// ```rust
/// use shopify_graphql::clients::graphql::ShopifyQuery;
///
/// let query = ShopifyQuery::query("products")
///     .variable("cursor", "String")
///     .argument("first", "50")
///     .argument("after", "$cursor")
///     .field("id")
///     .field("title");
///
/// let rendered = query.render();
/// assert!(rendered.starts_with("query products($cursor: String)"));
/// assert!(rendered.contains("edges { node { id title } }"));
/// assert!(rendered.contains("pageInfo { hasNextPage endCursor }"));
/// ```
#[derive(Clone, Debug)]
pub struct ShopifyQuery {
    operation: OperationType,
    operation_name: Option<String>,
    entity: String,
    variables: Vec<(String, String)>,
    arguments: Vec<(String, String)>,
    fields: Vec<QueryField>,
    connection: bool,
}

impl ShopifyQuery {
    /// Starts a query rooted at the given entity.
    #[must_use]
    pub fn query(entity: impl Into<String>) -> Self {
        Self::new(OperationType::Query, entity.into())
    }

    /// Starts a mutation rooted at the given entity.
    #[must_use]
    pub fn mutation(entity: impl Into<String>) -> Self {
        let mut built = Self::new(OperationType::Mutation, entity.into());
        built.connection = false;
        built
    }

    fn new(operation: OperationType, entity: String) -> Self {
        // Plural entities (products, orders, ...) are connections.
        let connection = entity.ends_with('s');
        Self {
            operation,
            operation_name: None,
            entity,
            variables: Vec::new(),
            arguments: Vec::new(),
            fields: Vec::new(),
            connection,
        }
    }

    /// Sets the operation name. Defaults to the entity name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Declares an operation variable, e.g. `("cursor", "String")`.
    #[must_use]
    pub fn variable(mut self, name: impl Into<String>, gql_type: impl Into<String>) -> Self {
        self.variables.push((name.into(), gql_type.into()));
        self
    }

    /// Adds an argument on the root entity. Values render verbatim.
    #[must_use]
    pub fn argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.push((name.into(), value.into()));
        self
    }

    /// Adds a leaf field to the selection.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.push(QueryField::new(name));
        self
    }

    /// Adds a nested field to the selection.
    #[must_use]
    pub fn nested(mut self, field: QueryField) -> Self {
        self.fields.push(field);
        self
    }

    /// Overrides connection wrapping for the root selection.
    #[must_use]
    pub const fn connection(mut self, connection: bool) -> Self {
        self.connection = connection;
        self
    }

    /// Renders the complete operation document.
    #[must_use]
    pub fn render(&self) -> String {
        let name = self.operation_name.as_deref().unwrap_or(&self.entity);
        let variables = if self.variables.is_empty() {
            String::new()
        } else {
            let declarations = self
                .variables
                .iter()
                .map(|(name, gql_type)| format!("${name}: {gql_type}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("({declarations})")
        };
        format!(
            "{} {name}{variables} {{ {} }}",
            self.operation,
            self.render_selection()
        )
    }

    /// Renders just the root entity selection, without the operation wrapper.
    #[must_use]
    pub fn render_selection(&self) -> String {
        let mut out = self.entity.clone();
        if !self.arguments.is_empty() {
            out.push('(');
            out.push_str(&render_arguments(&self.arguments));
            out.push(')');
        }
        let inner = render_fields(&self.fields);
        if self.connection {
            out.push_str(&format!(
                " {{ edges {{ node {{ {inner} }} }} pageInfo {{ hasNextPage endCursor }} }}"
            ));
        } else if !self.fields.is_empty() {
            out.push_str(&format!(" {{ {inner} }}"));
        }
        out
    }
}

/// Quotes a value as a GraphQL string literal for use in
/// [`argument`](ShopifyQuery::argument) positions.
#[must_use]
pub fn string_literal(value: &str) -> String {
    // serde_json string escaping matches GraphQL's.
    Value::String(value.to_string()).to_string()
}
