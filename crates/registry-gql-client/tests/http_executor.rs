//! HTTP collaborators against a wiremock GraphQL server.

use std::sync::Arc;
use std::time::Duration;

use registry_gql_client::{EndpointConfig, GraphqlHttpClient, GraphqlMutationLog};
use registry_gql_core::{
    ActionResult, ExecutorError, FieldMappingSpec, MutationFailure, QueryExecutor, Record,
    RegistryError, RegistryGqlManager,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn client(server: &MockServer) -> GraphqlHttpClient {
    GraphqlHttpClient::new(EndpointConfig::new(&format!("{}/api/graphql", server.uri()))).unwrap()
}

#[tokio::test]
async fn posts_query_and_parses_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/graphql"))
        .and(body_partial_json(json!({"query": "query { ping }"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {"ping": "pong"}})))
        .expect(1)
        .mount(&server)
        .await;

    let envelope = client(&server).execute("query { ping }").await.unwrap();

    assert_eq!(envelope.data, json!({"ping": "pong"}));
    assert!(envelope.errors().is_none());
}

#[tokio::test]
async fn sends_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let config = EndpointConfig::new(&format!("{}/api/graphql", server.uri())).with_token("secret");
    GraphqlHttpClient::new(config)
        .unwrap()
        .execute("query { ping }")
        .await
        .unwrap();
}

#[tokio::test]
async fn graphql_errors_on_bad_request_are_returned_as_envelope() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"errors": [{"message": "Cannot query field \"x\""}]})),
        )
        .mount(&server)
        .await;

    let envelope = client(&server).execute("query { x }").await.unwrap();

    let errors = envelope.errors().unwrap();
    assert_eq!(errors[0].message, "Cannot query field \"x\"");
}

#[tokio::test]
async fn server_errors_carry_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).execute("query { ping }").await.unwrap_err();

    match err {
        ExecutorError::Status { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_json_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let err = client(&server).execute("query { ping }").await.unwrap_err();

    assert!(matches!(err, ExecutorError::Decode(_)));
}

#[tokio::test]
async fn slow_backends_time_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {}}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let config = EndpointConfig::new(&format!("{}/api/graphql", server.uri()))
        .with_timeout(Duration::from_millis(100));
    let err = GraphqlHttpClient::new(config)
        .unwrap()
        .execute("query { ping }")
        .await
        .unwrap_err();

    assert!(matches!(err, ExecutorError::Transport(_)));
}

/// Acknowledges mutations by echoing their `clientMutationId` and reports
/// every `mutationLogs` lookup with the configured status code.
struct RegistryBackend {
    status: u64,
}

impl Respond for RegistryBackend {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).unwrap_or(Value::Null);
        let document = body["query"].as_str().unwrap_or_default();

        if document.trim_start().starts_with("mutation") {
            let id = document
                .split_once("clientMutationId: \"")
                .and_then(|(_, rest)| rest.split_once('"'))
                .map(|(id, _)| id)
                .unwrap_or_default();
            return ResponseTemplate::new(200).set_body_json(json!({
                "data": {"createPerson": {"clientMutationId": id, "internalId": "7"}}
            }));
        }

        let error = (self.status == 1).then_some("duplicate insuree");
        ResponseTemplate::new(200).set_body_json(json!({
            "data": {"mutationLogs": {
                "totalCount": 1,
                "pageInfo": {"hasNextPage": false, "endCursor": null},
                "edges": [{"cursor": "c0", "node": {"status": self.status, "error": error}}]
            }}
        }))
    }
}

async fn create_person(status: u64) -> registry_gql_core::Result<ActionResult> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(RegistryBackend { status })
        .mount(&server)
        .await;

    let executor: Arc<dyn QueryExecutor> = Arc::new(client(&server));
    let log = Arc::new(GraphqlMutationLog::new(executor.clone()));
    let manager = RegistryGqlManager::new(
        executor,
        log,
        FieldMappingSpec::new([("name", "firstName")]),
    );

    let record: Record = json!({"name": "Jo"}).as_object().cloned().unwrap();
    manager.mutate("createPerson", &record, false).await
}

#[tokio::test]
async fn mutation_resolves_through_the_mutation_log() {
    let result = create_person(2).await.unwrap();
    assert_eq!(result, ActionResult::ok(Value::Null));
}

#[tokio::test]
async fn failed_mutation_log_entry_rejects() {
    let err = create_person(1).await.unwrap_err();
    match err {
        RegistryError::Mutation(MutationFailure::Rejected { detail, .. }) => {
            assert_eq!(detail, "duplicate insuree")
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
