//! Integration tests for bulk operation submission, polling, staged
//! uploads, and result downloads.

mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shopify_graphql::{BulkOperationKind, BulkOperationStatus, GraphqlClient, GraphqlError};
use support::{mock_client, mock_options, test_session, FakeDeferrer};

const JOB_ID: &str = "gid://shopify/BulkOperation/42";

fn current_op(op: Value) -> Value {
    json!({"data": {"currentBulkOperation": op}})
}

fn running_op() -> Value {
    json!({
        "id": JOB_ID,
        "status": "RUNNING",
        "errorCode": null,
        "objectCount": "100",
        "url": null,
        "partialDataUrl": null
    })
}

fn completed_op(url: Option<&str>) -> Value {
    json!({
        "id": JOB_ID,
        "status": "COMPLETED",
        "errorCode": null,
        "objectCount": "2",
        "url": url,
        "partialDataUrl": null
    })
}

async fn mount_graphql(server: &MockServer, discriminator: &str, body: Value) {
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_string_contains(discriminator))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

// ============================================================================
// current_operation / is_running
// ============================================================================

#[tokio::test]
async fn test_current_operation_parses_the_node() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(running_op()),
    )
    .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let operation = client
        .bulk()
        .current_operation(BulkOperationKind::Query)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(operation.id, JOB_ID);
    assert_eq!(operation.status, BulkOperationStatus::Running);
    assert_eq!(operation.object_count, Some(100));
}

#[tokio::test]
async fn test_current_operation_null_means_none() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: MUTATION)",
        current_op(Value::Null),
    )
    .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let operation = client
        .bulk()
        .current_operation(BulkOperationKind::Mutation)
        .await
        .unwrap();
    assert!(operation.is_none());

    assert!(!client
        .bulk()
        .is_running(BulkOperationKind::Mutation)
        .await
        .unwrap());
}

// ============================================================================
// submit_query
// ============================================================================

#[tokio::test]
async fn test_submit_query_returns_the_job_id() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(Value::Null),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_string_contains("bulkOperationRunQuery"))
        .and(body_string_contains("products { edges { node { id } } }"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "bulkOperationRunQuery": {
                    "bulkOperation": {"id": JOB_ID, "status": "CREATED"},
                    "userErrors": []
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let job_id = client
        .bulk()
        .submit_query("products { edges { node { id } } }")
        .await
        .unwrap();

    assert_eq!(job_id, JOB_ID);
}

#[tokio::test]
async fn test_submit_query_blocked_while_one_is_running() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(running_op()),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_string_contains("bulkOperationRunQuery"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let error = client
        .bulk()
        .submit_query("products { edges { node { id } } }")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        GraphqlError::BulkOperationInProgress {
            kind: BulkOperationKind::Query
        }
    ));
}

#[tokio::test]
async fn test_submit_query_surfaces_user_errors() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(Value::Null),
    )
    .await;
    mount_graphql(
        &server,
        "bulkOperationRunQuery",
        json!({
            "data": {
                "bulkOperationRunQuery": {
                    "bulkOperation": null,
                    "userErrors": [{"field": "query", "message": "syntax error"}]
                }
            }
        }),
    )
    .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let error = client
        .bulk()
        .submit_query("products { edges { node { id } } }")
        .await
        .unwrap_err();

    match error {
        GraphqlError::Query { errors } => assert_eq!(errors[0]["message"], "syntax error"),
        other => panic!("expected Query, got {other:?}"),
    }
}

// ============================================================================
// poll_until_complete
// ============================================================================

#[tokio::test]
async fn test_poll_sleeps_between_checks_and_downloads_results() {
    let server = MockServer::start().await;
    let results_url = format!("{}/results.jsonl", server.uri());

    // Two RUNNING polls, then COMPLETED.
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_string_contains("currentBulkOperation(type: QUERY)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_op(running_op())))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(completed_op(Some(&results_url))),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/results.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":1}\n{\"id\":2}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let deferrer = Arc::new(FakeDeferrer::new(0));
    let client = mock_client(&server.uri(), Arc::clone(&deferrer));
    let results = client
        .bulk()
        .poll_until_complete(JOB_ID, BulkOperationKind::Query)
        .await
        .unwrap();

    assert_eq!(
        deferrer.sleeps(),
        vec![Duration::from_secs(1), Duration::from_secs(1)]
    );
    let records = results.records().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], 1);
}

#[tokio::test]
async fn test_completed_with_null_url_yields_empty_results() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(completed_op(None)),
    )
    .await;

    let deferrer = Arc::new(FakeDeferrer::new(0));
    let client = mock_client(&server.uri(), Arc::clone(&deferrer));
    let results = client
        .bulk()
        .poll_until_complete(JOB_ID, BulkOperationKind::Query)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert!(deferrer.sleeps().is_empty());
}

#[tokio::test]
async fn test_poll_for_a_different_operation_is_job_not_found() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(json!({
            "id": "gid://shopify/BulkOperation/999",
            "status": "RUNNING"
        })),
    )
    .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let error = client
        .bulk()
        .poll_until_complete(JOB_ID, BulkOperationKind::Query)
        .await
        .unwrap_err();

    assert!(matches!(error, GraphqlError::JobNotFound { job_id } if job_id == JOB_ID));
}

#[tokio::test]
async fn test_poll_with_no_current_operation_is_job_not_found() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(Value::Null),
    )
    .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let error = client
        .bulk()
        .poll_until_complete(JOB_ID, BulkOperationKind::Query)
        .await
        .unwrap_err();

    assert!(matches!(error, GraphqlError::JobNotFound { .. }));
}

#[tokio::test]
async fn test_failed_operation_surfaces_status_and_error_code() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(json!({
            "id": JOB_ID,
            "status": "FAILED",
            "errorCode": "ACCESS_DENIED"
        })),
    )
    .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let error = client
        .bulk()
        .poll_until_complete(JOB_ID, BulkOperationKind::Query)
        .await
        .unwrap_err();

    match error {
        GraphqlError::JobFailed {
            job_id,
            status,
            error_code,
            payload,
        } => {
            assert_eq!(job_id, JOB_ID);
            assert_eq!(status, BulkOperationStatus::Failed);
            assert_eq!(error_code.as_deref(), Some("ACCESS_DENIED"));
            assert_eq!(payload["errorCode"], "ACCESS_DENIED");
        }
        other => panic!("expected JobFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_poll_deadline_bounds_waiting() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(running_op()),
    )
    .await;

    let deferrer = Arc::new(FakeDeferrer::new(0));
    let options = mock_options(&server.uri(), Arc::clone(&deferrer))
        .poll_deadline(Duration::from_secs(3))
        .build();
    let client = GraphqlClient::with_options(test_session(), options);

    let error = client
        .bulk()
        .poll_until_complete(JOB_ID, BulkOperationKind::Query)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        GraphqlError::PollDeadlineExceeded(limit) if limit == Duration::from_secs(3)
    ));
    assert_eq!(deferrer.sleeps().len(), 3);
}

// ============================================================================
// run_query
// ============================================================================

#[tokio::test]
async fn test_run_query_submits_and_polls_to_completion() {
    let server = MockServer::start().await;
    let results_url = format!("{}/results.jsonl", server.uri());

    // First lookup (the in-flight check) finds nothing; the poll finds the
    // submitted operation already completed.
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_string_contains("currentBulkOperation(type: QUERY)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_op(Value::Null)))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: QUERY)",
        current_op(completed_op(Some(&results_url))),
    )
    .await;
    mount_graphql(
        &server,
        "bulkOperationRunQuery",
        json!({
            "data": {
                "bulkOperationRunQuery": {
                    "bulkOperation": {"id": JOB_ID, "status": "CREATED"},
                    "userErrors": []
                }
            }
        }),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/results.jsonl"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"id\":1}\n"))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let results = client
        .bulk()
        .run_query("products { edges { node { id } } }")
        .await
        .unwrap();

    assert_eq!(results.records().unwrap().len(), 1);
}

// ============================================================================
// submit_mutation and the staged upload flow
// ============================================================================

#[tokio::test]
async fn test_submit_mutation_stages_uploads_and_starts_the_run() {
    let server = MockServer::start().await;
    let upload_url = format!("{}/upload", server.uri());
    let staged_path = "tmp/12345/bulk/variables.jsonl";

    mount_graphql(
        &server,
        "currentBulkOperation(type: MUTATION)",
        current_op(Value::Null),
    )
    .await;
    mount_graphql(
        &server,
        "stagedUploadsCreate",
        json!({
            "data": {
                "stagedUploadsCreate": {
                    "stagedTargets": [{
                        "url": upload_url,
                        "resourceUrl": null,
                        "parameters": [
                            {"name": "key", "value": staged_path},
                            {"name": "policy", "value": "signed-policy"}
                        ]
                    }],
                    "userErrors": []
                }
            }
        }),
    )
    .await;
    // The upload carries the signed parameters and the JSONL payload.
    Mock::given(method("POST"))
        .and(path("/upload"))
        .and(body_string_contains(staged_path))
        .and(body_string_contains("signed-policy"))
        .and(body_string_contains("{\"input\":{\"title\":\"Shirt\"}}"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_string_contains("bulkOperationRunMutation"))
        .and(body_string_contains(staged_path))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "bulkOperationRunMutation": {
                    "bulkOperation": {"id": JOB_ID, "status": "CREATED"},
                    "userErrors": []
                }
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let rows = vec![json!({"title": "Shirt"}), json!({"title": "Hat"})];
    let job_id = client
        .bulk()
        .submit_mutation(
            "mutation productCreate($input: ProductInput!) { \
             productCreate(input: $input) { product { id } userErrors { field message } } }",
            &rows,
            Some("input"),
        )
        .await
        .unwrap();

    assert_eq!(job_id, JOB_ID);
}

#[tokio::test]
async fn test_submit_mutation_blocked_while_one_is_running() {
    let server = MockServer::start().await;
    mount_graphql(
        &server,
        "currentBulkOperation(type: MUTATION)",
        current_op(running_op()),
    )
    .await;
    Mock::given(method("POST"))
        .and(path("/graphql.json"))
        .and(body_string_contains("stagedUploadsCreate"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client(&server.uri(), Arc::new(FakeDeferrer::new(0)));
    let error = client
        .bulk()
        .submit_mutation("mutation { noop }", &[], None)
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        GraphqlError::BulkOperationInProgress {
            kind: BulkOperationKind::Mutation
        }
    ));
}
