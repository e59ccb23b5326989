//! Health probes and response headers.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use stitchtrack_integration_tests::TestContext;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_liveness() {
    let ctx = TestContext::start().await;
    let response = ctx.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(response.headers().contains_key("content-security-policy"));
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_readiness_follows_backend() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/health"))
        .respond_with(ResponseTemplate::new(200))
        .up_to_n_times(1)
        .mount(&ctx.supabase)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/v1/health"))
        .respond_with(ResponseTemplate::new(503))
        .with_priority(10)
        .mount(&ctx.supabase)
        .await;

    assert_eq!(ctx.get("/health/ready").await.status(), StatusCode::OK);
    assert_eq!(
        ctx.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
