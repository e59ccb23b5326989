//! Backend seams.
//!
//! [`OrderGateway`] covers row access for orders and [`AuthBackend`] covers
//! the hosted auth service. The Supabase client implements both; tests swap
//! in fakes.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use stitchtrack_core::{
    Email, NewOrder, Order, OrderChanges, OrderId, OrderNumber, OrderStatus, Phone, Profile, User,
    UserId,
};
use thiserror::Error;

/// Errors from the hosted backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error body.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// Rate limited by the backend.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// The row to update does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Key or access token rejected.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// `SUPABASE_URL` is empty or malformed.
    #[error("Backend is not configured")]
    NotConfigured,
}

/// Errors from sign-in, sign-out and session restore.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password, as reported by the auth service.
    #[error("{0}")]
    InvalidCredentials(String),

    /// The stored session expired or was revoked.
    #[error("Session expired")]
    SessionExpired,

    /// Any other backend failure.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Tokens issued by the auth service for one signed-in user.
#[derive(Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A successful sign-in or refresh.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub tokens: AuthTokens,
}

/// Row access for orders.
#[async_trait]
pub trait OrderGateway: Send + Sync {
    /// All orders, newest creation time first.
    async fn list_orders(&self) -> Result<Vec<Order>, BackendError>;

    /// One order by identifier.
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, BackendError>;

    /// One order by its customer-facing number.
    async fn get_order_by_number(&self, number: OrderNumber)
    -> Result<Option<Order>, BackendError>;

    /// The most recently created order for a phone number.
    async fn get_order_by_phone(&self, phone: &Phone) -> Result<Option<Order>, BackendError>;

    /// Insert an order. The stored status is always the initial status.
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError>;

    /// Set the status of an existing order.
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, BackendError>;

    /// Write the given fields of an existing order.
    async fn update_order(&self, id: OrderId, changes: &OrderChanges)
    -> Result<Order, BackendError>;
}

/// The hosted auth service plus the `profiles` lookup.
#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Password sign-in.
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Exchange a refresh token for a new session.
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError>;

    /// The user an access token belongs to.
    async fn get_user(&self, access_token: &str) -> Result<User, AuthError>;

    /// Revoke the session behind an access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// The profile row for `user_id`, read with the user's own token.
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: UserId,
    ) -> Result<Option<Profile>, BackendError>;
}

/// Supplies the bearer token for row access on behalf of a signed-in user.
pub trait AccessToken: Send + Sync {
    /// Current access token, or `None` to fall back to the anon key.
    fn access_token(&self) -> Option<String>;
}

/// Everything a browser session needs from the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// The auth service.
    fn auth(&self) -> Arc<dyn AuthBackend>;

    /// Order access on behalf of `token`'s user, or anonymously.
    fn orders(&self, token: Option<Arc<dyn AccessToken>>) -> Arc<dyn OrderGateway>;

    /// Whether the backend answers at all.
    async fn ready(&self) -> Result<(), BackendError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_backend_message() {
        let err = BackendError::Api {
            status: 409,
            message: "duplicate key value".to_string(),
        };
        assert_eq!(err.to_string(), "duplicate key value");
    }

    #[test]
    fn test_invalid_credentials_message_passes_through() {
        let err = AuthError::InvalidCredentials("Invalid login credentials".to_string());
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_tokens_debug_redacts() {
        let tokens = AuthTokens {
            access_token: "secret-access".to_string(),
            refresh_token: "secret-refresh".to_string(),
            expires_at: Utc::now(),
        };
        let debug_output = format!("{tokens:?}");
        assert!(!debug_output.contains("secret-access"));
        assert!(!debug_output.contains("secret-refresh"));
    }
}
