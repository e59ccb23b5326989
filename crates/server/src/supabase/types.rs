//! Wire types for the Supabase REST and auth APIs.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use stitchtrack_core::{NewOrder, OrderStatus, User};

use crate::gateway::{AuthSession, AuthTokens, BackendError};

/// Row written by an insert into `orders`.
#[derive(Debug, Serialize)]
pub struct OrderInsert<'a> {
    pub customer_name: &'a str,
    pub phone: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<&'a str>,
    pub fabric: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<&'a str>,
    pub status: OrderStatus,
}

impl<'a> From<&'a NewOrder> for OrderInsert<'a> {
    fn from(order: &'a NewOrder) -> Self {
        Self {
            customer_name: &order.customer_name,
            phone: order.phone.as_str(),
            email: order.email.as_ref().map(stitchtrack_core::Email::as_str),
            fabric: &order.fabric,
            notes: order.notes.as_deref(),
            status: NewOrder::INITIAL_STATUS,
        }
    }
}

/// Body of `POST /auth/v1/token?grant_type=password`.
#[derive(Debug, Serialize)]
pub struct PasswordGrant<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/v1/token?grant_type=refresh_token`.
#[derive(Debug, Serialize)]
pub struct RefreshGrant<'a> {
    pub refresh_token: &'a str,
}

/// Session returned by the token endpoint.
#[derive(Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl TokenResponse {
    /// Convert into a session, preferring the absolute expiry when present.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::Parse`] when the expiry cannot be represented.
    pub fn into_session(self, now: DateTime<Utc>) -> Result<AuthSession, BackendError> {
        let absolute = self
            .expires_at
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        let expires_at = match absolute {
            Some(at) => at,
            None => Duration::try_seconds(self.expires_in)
                .and_then(|lifetime| now.checked_add_signed(lifetime))
                .ok_or_else(|| {
                    BackendError::Parse(format!("expires_in out of range: {}", self.expires_in))
                })?,
        };

        Ok(AuthSession {
            user: self.user,
            tokens: AuthTokens {
                access_token: self.access_token,
                refresh_token: self.refresh_token,
                expires_at,
            },
        })
    }
}

/// Error body shapes used by PostgREST (`message`) and GoTrue (`msg`,
/// `error_description`, `error`).
#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pull the human-readable message out of an error body.
pub fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .msg
        .or(parsed.error_description)
        .or(parsed.message)
        .or(parsed.error)
        .filter(|m| !m.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use stitchtrack_core::OrderForm;

    #[test]
    fn test_insert_always_starts_shopping() {
        let order = OrderForm {
            customer_name: "Asha".to_string(),
            phone: "555-1234".to_string(),
            fabric: "Silk".to_string(),
            status: Some("paid".to_string()),
            ..OrderForm::default()
        }
        .validate()
        .unwrap();

        let value = serde_json::to_value(OrderInsert::from(&order)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "customer_name": "Asha",
                "phone": "555-1234",
                "fabric": "Silk",
                "status": "shopping",
            })
        );
    }

    #[test]
    fn test_error_message_precedence() {
        assert_eq!(
            error_message(r#"{"code":400,"msg":"Invalid login credentials"}"#).as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#)
                .as_deref(),
            Some("Invalid login credentials")
        );
        assert_eq!(
            error_message(r#"{"message":"permission denied for table orders"}"#).as_deref(),
            Some("permission denied for table orders")
        );
        assert_eq!(error_message("<html>bad gateway</html>"), None);
    }

    #[test]
    fn test_token_response_expiry() {
        let now = Utc::now();
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": 3600,
            "token_type": "bearer",
            "user": { "id": "0b9a8c7d-6e5f-4a3b-9c2d-1e0f9a8b7c6d", "email": "admin@example.com" },
        }))
        .unwrap();

        let session = response.into_session(now).unwrap();
        assert_eq!(session.tokens.expires_at, now + Duration::seconds(3600));
        assert_eq!(session.user.email.as_deref(), Some("admin@example.com"));
    }

    #[test]
    fn test_token_response_rejects_unrepresentable_expiry() {
        let response: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "a",
            "refresh_token": "r",
            "expires_in": i64::MAX,
            "user": { "id": "0b9a8c7d-6e5f-4a3b-9c2d-1e0f9a8b7c6d", "email": "admin@example.com" },
        }))
        .unwrap();

        assert!(matches!(
            response.into_session(Utc::now()),
            Err(BackendError::Parse(_))
        ));
    }
}
