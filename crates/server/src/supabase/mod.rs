//! Supabase REST and auth client.
//!
//! Talks to the two services a Supabase project exposes:
//!
//! - **PostgREST** at `/rest/v1/{table}` for `orders` and `profiles` rows
//! - **GoTrue** at `/auth/v1/*` for password sign-in, refresh and sign-out
//!
//! Every request carries the project anon key as `apikey`. The
//! `Authorization` bearer is the signed-in user's access token when one is
//! available and the anon key otherwise, so row-level security on the
//! backend decides what each caller may read and write.

mod auth;
mod orders;
mod types;

pub use orders::SupabaseOrders;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::config::SupabaseConfig;
use crate::gateway::{AccessToken, AuthBackend, Backend, BackendError, OrderGateway};

/// `Prefer` header asking PostgREST to return the written rows.
const RETURN_REPRESENTATION: &str = "return=representation";

/// Supabase API client.
///
/// Cheap to clone; the underlying HTTP connection pool is shared.
#[derive(Clone)]
pub struct SupabaseClient {
    inner: Arc<SupabaseClientInner>,
}

struct SupabaseClientInner {
    client: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
}

impl SupabaseClient {
    /// Create a new client for the configured project.
    ///
    /// An unconfigured project still yields a client; its requests fail with
    /// [`BackendError::NotConfigured`].
    ///
    /// # Errors
    ///
    /// Returns error if the key is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &SupabaseConfig) -> Result<Self, BackendError> {
        let mut headers = HeaderMap::new();

        let key = config.key.expose_secret();
        if !key.is_empty() {
            headers.insert(
                "apikey",
                HeaderValue::from_str(key)
                    .map_err(|e| BackendError::Parse(format!("Invalid API key format: {e}")))?,
            );
        }
        headers.insert("Accept", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("stitchtrack/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(SupabaseClientInner {
                client,
                base_url: config.url.clone(),
                anon_key: config.key.clone(),
            }),
        })
    }

    /// Project URL this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Check that the auth service answers.
    ///
    /// # Errors
    ///
    /// Returns the backend error when the project is unreachable.
    pub async fn ping(&self) -> Result<(), BackendError> {
        let url = self.url("/auth/v1/health", &[])?;
        let response = self
            .inner
            .client
            .get(url)
            .header("Authorization", self.bearer(None))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Build a URL under the project root with the given query pairs.
    fn url(&self, path: &str, query: &[(&str, &str)]) -> Result<Url, BackendError> {
        if self.inner.base_url.is_empty() {
            return Err(BackendError::NotConfigured);
        }

        let mut url = Url::parse(&format!("{}{path}", self.inner.base_url))
            .map_err(|_| BackendError::NotConfigured)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    fn bearer(&self, access_token: Option<&str>) -> String {
        format!(
            "Bearer {}",
            access_token.unwrap_or_else(|| self.inner.anon_key.expose_secret())
        )
    }

    /// Execute a GET request.
    pub(crate) async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        access_token: Option<&str>,
    ) -> Result<T, BackendError> {
        let url = self.url(path, query)?;
        let response = self
            .inner
            .client
            .get(url)
            .header("Authorization", self.bearer(access_token))
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request, asking for the written representation back.
    pub(crate) async fn post<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        access_token: Option<&str>,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.url(path, query)?;
        let response = self
            .inner
            .client
            .post(url)
            .header("Authorization", self.bearer(access_token))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a POST request whose response body is ignored.
    pub(crate) async fn post_empty(
        &self,
        path: &str,
        access_token: Option<&str>,
    ) -> Result<(), BackendError> {
        let url = self.url(path, &[])?;
        let response = self
            .inner
            .client
            .post(url)
            .header("Authorization", self.bearer(access_token))
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(());
        }
        Err(Self::parse_error(response).await)
    }

    /// Execute a PATCH request, asking for the written representation back.
    pub(crate) async fn patch<T: serde::de::DeserializeOwned, B: serde::Serialize + Sync>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        access_token: Option<&str>,
        body: &B,
    ) -> Result<T, BackendError> {
        let url = self.url(path, query)?;
        let response = self
            .inner
            .client
            .patch(url)
            .header("Authorization", self.bearer(access_token))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, BackendError> {
        if response.status().is_success() {
            return response
                .json()
                .await
                .map_err(|e| BackendError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse an error response from PostgREST or GoTrue.
    async fn parse_error(response: reqwest::Response) -> BackendError {
        let status = response.status().as_u16();

        if status == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return BackendError::RateLimited(retry_after);
        }

        let body = response.text().await.unwrap_or_default();
        let message = types::error_message(&body).unwrap_or_else(|| {
            if body.is_empty() {
                format!("Request failed with status {status}")
            } else {
                body.clone()
            }
        });

        match status {
            401 | 403 => BackendError::Unauthorized(message),
            404 => BackendError::NotFound(message),
            _ => BackendError::Api { status, message },
        }
    }
}

#[async_trait]
impl Backend for SupabaseClient {
    fn auth(&self) -> Arc<dyn AuthBackend> {
        Arc::new(self.clone())
    }

    fn orders(&self, token: Option<Arc<dyn AccessToken>>) -> Arc<dyn OrderGateway> {
        Arc::new(match token {
            Some(token) => SupabaseOrders::with_token(self.clone(), token),
            None => SupabaseOrders::anonymous(self.clone()),
        })
    }

    async fn ready(&self) -> Result<(), BackendError> {
        self.ping().await
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}
