//! HTTP-level retry semantics against a mock batch endpoint.

use std::time::{Duration, Instant};

use graph_batch_rs::batch::Method;
use graph_batch_rs::{BatchTransport, Error, GraphContext, HttpTransport, RetryPolicy, SubRequest};
use serde_json::json;

fn context(base_url: &str) -> GraphContext {
    GraphContext::builder()
        .access_token("test-token")
        .account_id("act_1")
        .date_start("2026-01-01")
        .date_end("2026-01-31")
        .breakdowns(vec![])
        .base_url(base_url)
        .build()
        .unwrap()
}

fn batch() -> Vec<SubRequest> {
    vec![SubRequest::new(Method::Get, "1/insights?limit=200")]
}

#[tokio::test]
async fn first_success_returns_without_retrying() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"[{"code": 200, "body": "{\"data\":[1]}"}]"#)
        .expect(1)
        .create_async()
        .await;

    let transport = HttpTransport::new(&context(&server.url())).unwrap();
    let results = transport.execute_batch(&batch()).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].code, 200);
    assert_eq!(results[0].body, r#"{"data":[1]}"#);
    mock.assert_async().await;
}

#[tokio::test]
async fn client_error_fails_immediately_without_retry() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(400)
        .with_body(r#"{"error": {"message": "bad request"}}"#)
        .expect(1)
        .create_async()
        .await;

    let transport = HttpTransport::new(&context(&server.url())).unwrap();
    let start = Instant::now();
    let err = transport.execute_batch(&batch()).await.unwrap_err();

    // A client error must not consume the retry budget.
    assert!(start.elapsed() < Duration::from_secs(5));
    match err {
        Error::Client {
            status,
            method,
            response,
            ..
        } => {
            assert_eq!(status, 400);
            assert_eq!(method, "POST");
            assert_eq!(
                response.pointer("/error/message"),
                Some(&json!("bad request"))
            );
        }
        other => panic!("expected client error, got {other:?}"),
    }
    mock.assert_async().await;
}

#[tokio::test]
async fn server_errors_retry_until_the_budget_elapses() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/")
        .with_status(503)
        .with_body("overloaded")
        .expect_at_least(2)
        .create_async()
        .await;

    let policy = RetryPolicy {
        time_budget: Duration::from_millis(300),
        retry_delay: Duration::from_millis(100),
    };
    let transport = HttpTransport::new(&context(&server.url()))
        .unwrap()
        .with_retry_policy(policy.clone());

    let start = Instant::now();
    let err = transport.execute_batch(&batch()).await.unwrap_err();

    assert!(start.elapsed() >= policy.time_budget);
    match err {
        Error::Timeout {
            url,
            elapsed_ms,
            response,
            ..
        } => {
            assert!(url.is_some());
            assert!(elapsed_ms >= policy.time_budget.as_millis());
            assert_eq!(response, Some(json!("overloaded")));
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    mock.assert_async().await;
}
