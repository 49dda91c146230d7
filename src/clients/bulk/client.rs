//! Submitting, polling, and downloading bulk operations.

use serde_json::{json, Value};
use uuid::Uuid;

use crate::clients::bulk::operation::{BulkOperation, BulkOperationKind, BulkOperationStatus};
use crate::clients::bulk::reader::{encode_jsonl, JsonlReader};
use crate::clients::errors::GraphqlError;
use crate::clients::graphql::{GraphqlClient, QueryPayload};

/// Fields selected on every `currentBulkOperation` lookup.
const OPERATION_FIELDS: &str =
    "id status errorCode createdAt completedAt objectCount fileSize url partialDataUrl";

const STAGED_UPLOADS_CREATE: &str = "mutation stagedUploadsCreate($input: [StagedUploadInput!]!) { \
     stagedUploadsCreate(input: $input) { \
     stagedTargets { url resourceUrl parameters { name value } } \
     userErrors { field message } } }";

const RUN_MUTATION: &str =
    "mutation bulkOperationRunMutation($mutation: String!, $stagedUploadPath: String!) { \
     bulkOperationRunMutation(mutation: $mutation, stagedUploadPath: $stagedUploadPath) { \
     bulkOperation { id status } userErrors { field message } } }";

/// Bulk operation workflows on top of a [`GraphqlClient`].
///
/// Obtained from [`GraphqlClient::bulk`]; borrows the client so every
/// GraphQL call it makes goes through the same retry and cost-limiting
/// pipeline.
///
/// # Example
///
/// ```rust,no_run
/// use shopify_graphql::{GraphqlClient, Session, ShopDomain};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = GraphqlClient::new(Session::public(
///     ShopDomain::new("my-store")?,
///     "shpat_token",
/// ));
///
/// let results = client
///     .bulk()
///     .run_query("products { edges { node { id title } } }")
///     .await?;
/// for record in results.records()? {
///     println!("{record}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct BulkOperations<'a> {
    client: &'a GraphqlClient,
}

impl<'a> BulkOperations<'a> {
    pub(crate) const fn new(client: &'a GraphqlClient) -> Self {
        Self { client }
    }

    /// Fetches the shop's current bulk operation of the given kind, if one
    /// exists.
    ///
    /// # Errors
    ///
    /// Propagates call failures; a malformed `currentBulkOperation` node
    /// surfaces as [`GraphqlError::Query`].
    pub async fn current_operation(
        &self,
        kind: BulkOperationKind,
    ) -> Result<Option<BulkOperation>, GraphqlError> {
        let node = self.current_operation_node(kind).await?;
        if node.is_null() {
            return Ok(None);
        }
        parse_operation(&node).map(Some)
    }

    async fn current_operation_node(
        &self,
        kind: BulkOperationKind,
    ) -> Result<Value, GraphqlError> {
        let query =
            format!("query {{ currentBulkOperation(type: {kind}) {{ {OPERATION_FIELDS} }} }}");
        let result = self.client.execute(query, None).await?;
        Ok(result
            .data()
            .and_then(|data| data.get("currentBulkOperation"))
            .cloned()
            .unwrap_or(Value::Null))
    }

    /// Whether a bulk operation of this kind is currently in flight.
    ///
    /// # Errors
    ///
    /// Propagates call failures.
    pub async fn is_running(&self, kind: BulkOperationKind) -> Result<bool, GraphqlError> {
        Ok(self
            .current_operation(kind)
            .await?
            .is_some_and(|operation| operation.status.is_active()))
    }

    /// Submits a bulk query and returns the operation id.
    ///
    /// `query` is the selection on the root entity, without the outer
    /// `query { }` wrapper; `bulkOperationRunQuery` adds its own.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::BulkOperationInProgress`] if a query
    /// operation is already running; otherwise propagates call failures and
    /// surfaces `userErrors` as [`GraphqlError::Query`].
    pub async fn submit_query(
        &self,
        query: impl Into<QueryPayload>,
    ) -> Result<String, GraphqlError> {
        if self.is_running(BulkOperationKind::Query).await? {
            return Err(GraphqlError::BulkOperationInProgress {
                kind: BulkOperationKind::Query,
            });
        }

        let selection = query.into().render_selection();
        let mutation = format!(
            "mutation {{ bulkOperationRunQuery(query: \"\"\"\n{{\n{selection}\n}}\n\"\"\") {{ \
             bulkOperation {{ id status }} userErrors {{ field message }} }} }}"
        );

        let result = self.client.execute(mutation, None).await?;
        let payload = field_payload(&result.data(), "bulkOperationRunQuery")?;
        check_user_errors(&payload)?;
        operation_id(&payload)
    }

    /// Submits a bulk mutation: encodes `rows` as JSONL, stages the file
    /// upload, uploads it, and starts `bulkOperationRunMutation`. Returns
    /// the operation id.
    ///
    /// `mutation` is the mutation document run once per JSONL line;
    /// `wrap_key` optionally wraps each row under a named variable (see
    /// [`encode_jsonl`]).
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::BulkOperationInProgress`] if a mutation
    /// operation is already running; upload failures surface as
    /// [`GraphqlError::Transport`].
    pub async fn submit_mutation(
        &self,
        mutation: &str,
        rows: &[Value],
        wrap_key: Option<&str>,
    ) -> Result<String, GraphqlError> {
        if self.is_running(BulkOperationKind::Mutation).await? {
            return Err(GraphqlError::BulkOperationInProgress {
                kind: BulkOperationKind::Mutation,
            });
        }

        let filename = format!("{}.jsonl", Uuid::new_v4());
        let staged = self.stage_upload(&filename).await?;
        let jsonl = encode_jsonl(rows, wrap_key);
        tracing::info!(
            filename = %filename,
            rows = rows.len(),
            "uploading staged bulk mutation variables"
        );
        self.upload_staged_file(&staged, &filename, jsonl).await?;

        let variables = json!({
            "mutation": mutation,
            "stagedUploadPath": staged.key,
        });
        let result = self.client.execute(RUN_MUTATION, Some(variables)).await?;
        let payload = field_payload(&result.data(), "bulkOperationRunMutation")?;
        check_user_errors(&payload)?;
        operation_id(&payload)
    }

    async fn stage_upload(&self, filename: &str) -> Result<StagedTarget, GraphqlError> {
        let variables = json!({
            "input": [{
                "resource": "BULK_MUTATION_VARIABLES",
                "filename": filename,
                "mimeType": "text/jsonl",
                "httpMethod": "POST",
            }]
        });
        let result = self
            .client
            .execute(STAGED_UPLOADS_CREATE, Some(variables))
            .await?;
        let payload = field_payload(&result.data(), "stagedUploadsCreate")?;
        check_user_errors(&payload)?;

        let target = payload
            .get("stagedTargets")
            .and_then(Value::as_array)
            .and_then(|targets| targets.first())
            .ok_or_else(|| malformed("stagedUploadsCreate returned no staged targets"))?;
        let url = target
            .get("url")
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("staged target is missing its upload url"))?
            .to_string();
        let parameters: Vec<(String, String)> = target
            .get("parameters")
            .and_then(Value::as_array)
            .map(|parameters| {
                parameters
                    .iter()
                    .filter_map(|parameter| {
                        Some((
                            parameter.get("name")?.as_str()?.to_string(),
                            parameter.get("value")?.as_str()?.to_string(),
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default();
        let key = parameters
            .iter()
            .find(|(name, _)| name == "key")
            .map(|(_, value)| value.clone())
            .ok_or_else(|| malformed("staged target parameters are missing the key entry"))?;

        Ok(StagedTarget {
            url,
            key,
            parameters,
        })
    }

    async fn upload_staged_file(
        &self,
        staged: &StagedTarget,
        filename: &str,
        jsonl: String,
    ) -> Result<(), GraphqlError> {
        let mut form = reqwest::multipart::Form::new();
        for (name, value) in &staged.parameters {
            form = form.text(name.clone(), value.clone());
        }
        let part = reqwest::multipart::Part::bytes(jsonl.into_bytes())
            .file_name(filename.to_string())
            .mime_str("text/jsonl")
            .map_err(|source| GraphqlError::Transport { source, retries: 0 })?;
        form = form.part("file", part);

        self.client
            .http()
            .post(&staged.url)
            .multipart(form)
            .send()
            .await
            .map_err(|source| GraphqlError::Transport { source, retries: 0 })?
            .error_for_status()
            .map_err(|source| GraphqlError::Transport { source, retries: 0 })?;
        Ok(())
    }

    /// Polls the operation until it reaches a terminal state, then
    /// downloads its results.
    ///
    /// Sleeps [`poll_interval`](crate::config::ClientOptions::poll_interval)
    /// between polls. A completed operation with a null download URL yields
    /// an empty reader without any download.
    ///
    /// # Errors
    ///
    /// Returns [`GraphqlError::JobNotFound`] when the current operation is
    /// missing or is not `job_id`, [`GraphqlError::JobFailed`] on a
    /// non-completed terminal state, and
    /// [`GraphqlError::PollDeadlineExceeded`] when a configured
    /// [`poll_deadline`](crate::config::ClientOptions::poll_deadline)
    /// passes first.
    pub async fn poll_until_complete(
        &self,
        job_id: &str,
        kind: BulkOperationKind,
    ) -> Result<JsonlReader, GraphqlError> {
        let deferrer = self.client.options().deferrer();
        let deadline = self
            .client
            .options()
            .poll_deadline()
            .map(|limit| (limit, deferrer.now_ms().saturating_add(limit.as_millis() as u64)));

        loop {
            let node = self.current_operation_node(kind).await?;
            if node.is_null() {
                return Err(GraphqlError::JobNotFound {
                    job_id: job_id.to_string(),
                });
            }
            let operation = parse_operation(&node)?;
            if operation.id != job_id {
                return Err(GraphqlError::JobNotFound {
                    job_id: job_id.to_string(),
                });
            }

            match operation.status {
                BulkOperationStatus::Created | BulkOperationStatus::Running => {
                    tracing::debug!(
                        job_id,
                        status = %operation.status,
                        object_count = operation.object_count,
                        "bulk operation still in flight"
                    );
                    if let Some((limit, deadline_ms)) = deadline {
                        if deferrer.now_ms() >= deadline_ms {
                            return Err(GraphqlError::PollDeadlineExceeded(limit));
                        }
                    }
                    deferrer.sleep(self.client.options().poll_interval()).await;
                }
                BulkOperationStatus::Completed => {
                    tracing::info!(
                        job_id,
                        object_count = operation.object_count,
                        "bulk operation completed"
                    );
                    return match &operation.url {
                        Some(url) => self.download_results(url).await,
                        None => Ok(JsonlReader::empty()),
                    };
                }
                status => {
                    return Err(GraphqlError::JobFailed {
                        job_id: job_id.to_string(),
                        status,
                        error_code: operation.error_code,
                        payload: node,
                    });
                }
            }
        }
    }

    async fn download_results(&self, url: &str) -> Result<JsonlReader, GraphqlError> {
        let text = self
            .client
            .http()
            .get(url)
            .send()
            .await
            .map_err(|source| GraphqlError::Transport { source, retries: 0 })?
            .error_for_status()
            .map_err(|source| GraphqlError::Transport { source, retries: 0 })?
            .text()
            .await
            .map_err(|source| GraphqlError::Transport { source, retries: 0 })?;
        Ok(JsonlReader::new(text))
    }

    /// Submits a bulk query and polls it to completion in one step.
    ///
    /// # Errors
    ///
    /// Combines the failure modes of [`submit_query`](Self::submit_query)
    /// and [`poll_until_complete`](Self::poll_until_complete).
    pub async fn run_query(
        &self,
        query: impl Into<QueryPayload>,
    ) -> Result<JsonlReader, GraphqlError> {
        let job_id = self.submit_query(query).await?;
        self.poll_until_complete(&job_id, BulkOperationKind::Query)
            .await
    }
}

struct StagedTarget {
    url: String,
    key: String,
    parameters: Vec<(String, String)>,
}

fn parse_operation(node: &Value) -> Result<BulkOperation, GraphqlError> {
    serde_json::from_value(node.clone())
        .map_err(|error| malformed(&format!("unexpected currentBulkOperation shape: {error}")))
}

fn field_payload(data: &Option<&Value>, field: &str) -> Result<Value, GraphqlError> {
    data.and_then(|data| data.get(field))
        .filter(|payload| !payload.is_null())
        .cloned()
        .ok_or_else(|| malformed(&format!("response is missing the {field} payload")))
}

fn check_user_errors(payload: &Value) -> Result<(), GraphqlError> {
    if let Some(user_errors) = payload.get("userErrors").and_then(Value::as_array) {
        if !user_errors.is_empty() {
            return Err(GraphqlError::Query {
                errors: Value::Array(user_errors.clone()),
            });
        }
    }
    Ok(())
}

fn operation_id(payload: &Value) -> Result<String, GraphqlError> {
    payload
        .get("bulkOperation")
        .and_then(|operation| operation.get("id"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| malformed("response is missing the bulk operation id"))
}

fn malformed(message: &str) -> GraphqlError {
    GraphqlError::Query {
        errors: json!({ "message": message }),
    }
}
