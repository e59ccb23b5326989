//! Integration tests for StitchTrack.
//!
//! Each test starts the full server on an ephemeral port in front of a
//! `wiremock` Supabase, then drives it over HTTP with a cookie-keeping
//! client that does not follow redirects.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p stitchtrack-integration-tests
//! ```

#![allow(clippy::expect_used, clippy::missing_panics_doc)]

use reqwest::{Client, Response, StatusCode, header};
use serde_json::{Value, json};
use stitchtrack_server::config::AppConfig;
use stitchtrack_server::state::AppState;
use wiremock::matchers::{body_json, method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Anon key the server is configured with.
pub const ANON_KEY: &str = "integration-anon-key";

/// The one account the mocked auth service knows.
pub const ADMIN_EMAIL: &str = "meera@example.com";
pub const ADMIN_PASSWORD: &str = "correct-horse";
pub const USER_ID: &str = "0b9a8c7d-6e5f-4a3b-9c2d-1e0f9a8b7c6d";

/// A running server and the backend mock behind it.
pub struct TestContext {
    pub supabase: MockServer,
    pub base_url: String,
    pub client: Client,
}

impl TestContext {
    /// Start a mock backend and a server pointed at it.
    pub async fn start() -> Self {
        let supabase = MockServer::start().await;
        let config = AppConfig::for_backend(&supabase.uri(), ANON_KEY);
        let state = AppState::new(config).expect("Failed to create application state");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");
        let app = stitchtrack_server::app(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        let client = Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            supabase,
            base_url: format!("http://{addr}"),
            client,
        }
    }

    /// GET a path on the server.
    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{path}", self.base_url))
            .send()
            .await
            .expect("GET failed")
    }

    /// POST a form to a path on the server.
    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> Response {
        self.client
            .post(format!("{}{path}", self.base_url))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// Sign in through the login form.
    pub async fn login(&self, password: &str) -> Response {
        self.post_form("/login", &[("email", ADMIN_EMAIL), ("password", password)])
            .await
    }

    /// Sign in as the admin and check the redirect to the dashboard.
    pub async fn login_as_admin(&self) {
        mount_auth(&self.supabase, true).await;
        let response = self.login(ADMIN_PASSWORD).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), Some("/admin"));
    }
}

/// `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// An `orders` row as PostgREST returns it.
#[must_use]
pub fn order_row(id: &str, number: i64, customer: &str, phone: &str, status: &str) -> Value {
    json!({
        "id": id,
        "order_number": number,
        "customer_name": customer,
        "phone": phone,
        "email": null,
        "fabric": "Silk",
        "notes": null,
        "status": status,
        "created_at": "2025-03-01T10:00:00+00:00",
        "updated_at": "2025-03-01T10:00:00+00:00",
        "created_by": null,
    })
}

/// Mount the auth service: password sign-in for the one account (anything
/// else is rejected), its profile and sign-out.
pub async fn mount_auth(server: &MockServer, is_admin: bool) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_json(
            json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "access-1",
            "token_type": "bearer",
            "expires_in": 3600,
            "refresh_token": "refresh-1",
            "user": { "id": USER_ID, "email": ADMIN_EMAIL, "aud": "authenticated" },
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": 400,
            "error_code": "invalid_credentials",
            "msg": "Invalid login credentials",
        })))
        .with_priority(10)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": USER_ID,
            "email": ADMIN_EMAIL,
            "full_name": "Meera",
            "is_admin": is_admin,
            "created_at": "2025-01-01T00:00:00+00:00",
            "updated_at": "2025-01-01T00:00:00+00:00",
        }])))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}

/// Mount the order list (`GET /rest/v1/orders` without `limit`).
pub async fn mount_order_list(server: &MockServer, rows: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/orders"))
        .and(query_param_is_missing("limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(Value::Array(rows)))
        .mount(server)
        .await;
}
