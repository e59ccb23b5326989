//! Dashboard, create dialog and status changes against a mocked backend.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use reqwest::StatusCode;
use serde_json::json;
use stitchtrack_integration_tests::{TestContext, location, mount_order_list, order_row};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

const ASHA_ID: &str = "6f1d2c3b-4a59-4e8f-9d7c-0b1a2e3f4d5c";
const RAVI_ID: &str = "a2b3c4d5-e6f7-4a8b-9c0d-1e2f3a4b5c6d";

#[tokio::test]
async fn test_dashboard_lists_and_filters_orders() {
    let ctx = TestContext::start().await;
    mount_order_list(
        &ctx.supabase,
        vec![
            order_row(RAVI_ID, 2, "Ravi", "555-2222", "stitching"),
            order_row(ASHA_ID, 1, "Asha", "555-1111", "paid"),
        ],
    )
    .await;
    ctx.login_as_admin().await;

    let body = ctx.get("/admin").await.text().await.unwrap();
    assert!(body.contains("Ravi"));
    assert!(body.contains("Asha"));

    let response = ctx.get("/admin?status=paid").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Asha"));
    assert!(!body.contains("Ravi"));
}

#[tokio::test]
async fn test_dashboard_shows_backend_error() {
    let ctx = TestContext::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/orders"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({ "message": "relation is on fire" })),
        )
        .mount(&ctx.supabase)
        .await;
    ctx.login_as_admin().await;

    let response = ctx.get("/admin").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains("relation is on fire"));
}

#[tokio::test]
async fn test_create_order_starts_at_shopping() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/orders"))
        .and(body_partial_json(
            json!({ "customer_name": "Asha", "phone": "555-1111", "status": "shopping" }),
        ))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([order_row(
            ASHA_ID, 1, "Asha", "555-1111", "shopping"
        )])))
        .expect(1)
        .mount(&ctx.supabase)
        .await;
    mount_order_list(
        &ctx.supabase,
        vec![order_row(ASHA_ID, 1, "Asha", "555-1111", "shopping")],
    )
    .await;
    ctx.login_as_admin().await;

    let response = ctx
        .post_form(
            "/admin/orders",
            &[
                ("customer_name", "Asha"),
                ("phone", "555-1111"),
                ("fabric", "Silk"),
                ("status", "paid"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), Some("/admin"));

    let body = ctx.get("/admin").await.text().await.unwrap();
    assert!(body.contains("Order #1 created"));
}

#[tokio::test]
async fn test_invalid_create_never_reaches_backend() {
    let ctx = TestContext::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/orders"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&ctx.supabase)
        .await;
    ctx.login_as_admin().await;

    let response = ctx
        .post_form(
            "/admin/orders",
            &[("customer_name", ""), ("phone", "555-1111"), ("fabric", "Silk")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.text().await.unwrap().contains(r#"class="field-error""#));
}

#[tokio::test]
async fn test_status_change_from_detail_returns_to_detail() {
    let ctx = TestContext::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/orders"))
        .and(query_param("id", format!("eq.{ASHA_ID}")))
        .and(body_partial_json(json!({ "status": "shipping" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([order_row(
            ASHA_ID, 1, "Asha", "555-1111", "shipping"
        )])))
        .expect(1)
        .mount(&ctx.supabase)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/orders"))
        .and(query_param("id", format!("eq.{ASHA_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([order_row(
            ASHA_ID, 1, "Asha", "555-1111", "shipping"
        )])))
        .mount(&ctx.supabase)
        .await;
    ctx.login_as_admin().await;

    let response = ctx
        .post_form(
            &format!("/admin/orders/{ASHA_ID}/status"),
            &[("status", "shipping"), ("from", "detail")],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let detail = format!("/admin/orders/{ASHA_ID}");
    assert_eq!(location(&response), Some(detail.as_str()));

    let body = ctx.get(&detail).await.text().await.unwrap();
    assert!(body.contains("Order #1 moved to Shipping"));
}
