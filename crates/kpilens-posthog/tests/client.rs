use std::time::Duration;

use serde_json::json;
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

use kpilens_core::{
    daterange::resolve,
    query::{build, BuildOptions, ConcreteQuery, QueryTemplate},
    upstream::{ProjectCredentials, UpstreamError, UpstreamQuery},
};
use kpilens_posthog::PosthogClient;

fn credentials() -> ProjectCredentials {
    ProjectCredentials {
        project_id: "4242".to_string(),
        api_key: "phx_test_key".to_string(),
    }
}

fn trends_query() -> ConcreteQuery {
    let template = QueryTemplate::new(json!({ "kind": "TrendsQuery", "series": [] }));
    build(&template, &resolve("7d"), BuildOptions::default())
}

fn client_for(server: &MockServer) -> PosthogClient {
    PosthogClient::new(&server.uri(), Duration::from_secs(5)).expect("client")
}

#[tokio::test]
async fn posts_query_with_bearer_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/projects/4242/query"))
        .and(header("authorization", "Bearer phx_test_key"))
        .and(body_partial_json(json!({
            "query": { "kind": "TrendsQuery", "dateRange": { "date_from": "-7d" } }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "data": [1, 2, 3] }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client_for(&server)
        .run(&credentials(), &trends_query())
        .await
        .expect("payload");
    assert_eq!(payload["results"][0]["data"], json!([1, 2, 3]));
}

#[tokio::test]
async fn non_success_status_carries_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "Permission denied" })),
        )
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run(&credentials(), &trends_query())
        .await
        .expect_err("403");
    assert_eq!(
        err,
        UpstreamError::Status {
            status: 403,
            message: "Permission denied".to_string()
        }
    );
}

#[tokio::test]
async fn error_field_in_success_body_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": null,
            "error": "Query exceeded memory limit"
        })))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run(&credentials(), &trends_query())
        .await
        .expect_err("logical error");
    assert_eq!(
        err,
        UpstreamError::Logical("Query exceeded memory limit".to_string())
    );
}

#[tokio::test]
async fn undecodable_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server)
        .run(&credentials(), &trends_query())
        .await
        .expect_err("decode");
    assert!(matches!(err, UpstreamError::Decode(_)), "{err:?}");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "results": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let client = PosthogClient::new(&server.uri(), Duration::from_millis(200)).expect("client");
    let err = client
        .run(&credentials(), &trends_query())
        .await
        .expect_err("timeout");
    assert!(matches!(err, UpstreamError::Transport(_)), "{err:?}");
}

#[tokio::test]
async fn invalid_key_never_reaches_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": [] })))
        .expect(0)
        .mount(&server)
        .await;

    let bad = ProjectCredentials {
        project_id: "4242".to_string(),
        api_key: "phc_project_token".to_string(),
    };
    let err = client_for(&server)
        .run(&bad, &trends_query())
        .await
        .expect_err("invalid key");
    assert!(matches!(err, UpstreamError::InvalidApiKey(_)));
}
