//! Sign-in, sign-out and the admin guards.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::StatusCode;
use stitchtrack_integration_tests::{ADMIN_PASSWORD, TestContext, location, mount_auth};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_dashboard_redirects_anonymous_visitor_to_login() {
    let ctx = TestContext::start().await;

    let response = ctx.get("/admin").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = ctx.get("/admin/orders/new").await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_wrong_password_keeps_visitor_on_login_form() {
    let ctx = TestContext::start().await;
    mount_auth(&ctx.supabase, true).await;

    let response = ctx.login("not-the-password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Invalid login credentials"));
    assert!(body.contains("meera@example.com"));

    let response = ctx.get("/admin").await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_admin_login_opens_dashboard() {
    let ctx = TestContext::start().await;
    stitchtrack_integration_tests::mount_order_list(&ctx.supabase, Vec::new()).await;
    ctx.login_as_admin().await;

    let response = ctx.get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Meera"));
}

#[tokio::test]
async fn test_non_admin_login_is_refused_and_signed_out() {
    let ctx = TestContext::start().await;
    mount_auth(&ctx.supabase, false).await;

    let response = ctx.login(ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("You do not have admin access."));

    let response = ctx.get("/admin").await;
    assert_eq!(location(&response), Some("/login"));

    let requests = ctx.supabase.received_requests().await.unwrap();
    assert!(requests.iter().any(|r| r.url.path() == "/auth/v1/logout"));
}

#[tokio::test]
async fn test_logout_closes_the_dashboard() {
    let ctx = TestContext::start().await;
    stitchtrack_integration_tests::mount_order_list(&ctx.supabase, Vec::new()).await;
    ctx.login_as_admin().await;

    let response = ctx.post_form("/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/login"));

    let response = ctx.get("/admin").await;
    assert_eq!(location(&response), Some("/login"));
}

#[tokio::test]
async fn test_auth_outage_shows_generic_message() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&ctx.supabase)
        .await;

    let response = ctx.login(ADMIN_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(location(&response).is_none());
    let body = response.text().await.unwrap();
    assert!(body.contains("Login failed. Please try again."));
}
