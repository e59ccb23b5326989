//! GoTrue auth endpoints and the `profiles` lookup.

use async_trait::async_trait;
use chrono::Utc;
use stitchtrack_core::{Email, Profile, User, UserId};
use tracing::instrument;

use super::SupabaseClient;
use super::types::{PasswordGrant, RefreshGrant, TokenResponse};
use crate::gateway::{AuthBackend, AuthError, AuthSession, BackendError};

const TOKEN_PATH: &str = "/auth/v1/token";
const USER_PATH: &str = "/auth/v1/user";
const LOGOUT_PATH: &str = "/auth/v1/logout";
const PROFILES_PATH: &str = "/rest/v1/profiles";

#[async_trait]
impl AuthBackend for SupabaseClient {
    #[instrument(skip(self, email, password), fields(email = %email))]
    async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let grant = PasswordGrant {
            email: email.as_str(),
            password,
        };
        let response: TokenResponse = self
            .post(TOKEN_PATH, &[("grant_type", "password")], None, &grant)
            .await
            .map_err(|e| match e {
                BackendError::Api { status: 400, message } => AuthError::InvalidCredentials(message),
                other => AuthError::Backend(other),
            })?;

        response
            .into_session(Utc::now())
            .map_err(AuthError::Backend)
    }

    #[instrument(skip_all)]
    async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, AuthError> {
        let grant = RefreshGrant { refresh_token };
        let response: TokenResponse = self
            .post(TOKEN_PATH, &[("grant_type", "refresh_token")], None, &grant)
            .await
            .map_err(expired_or_backend)?;

        response
            .into_session(Utc::now())
            .map_err(AuthError::Backend)
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<User, AuthError> {
        self.get(USER_PATH, &[], Some(access_token))
            .await
            .map_err(expired_or_backend)
    }

    #[instrument(skip_all)]
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        match self.post_empty(LOGOUT_PATH, Some(access_token)).await {
            // A token the server no longer knows is already signed out.
            Ok(()) | Err(BackendError::Unauthorized(_) | BackendError::NotFound(_)) => Ok(()),
            Err(e) => Err(AuthError::Backend(e)),
        }
    }

    #[instrument(skip(self, access_token, user_id), fields(user_id = %user_id))]
    async fn fetch_profile(
        &self,
        access_token: &str,
        user_id: UserId,
    ) -> Result<Option<Profile>, BackendError> {
        let filter = format!("eq.{user_id}");
        let rows: Vec<Profile> = self
            .get(
                PROFILES_PATH,
                &[("select", "*"), ("id", filter.as_str()), ("limit", "1")],
                Some(access_token),
            )
            .await?;
        Ok(rows.into_iter().next())
    }
}

fn expired_or_backend(e: BackendError) -> AuthError {
    match e {
        BackendError::Unauthorized(_) | BackendError::Api { status: 400, .. } => {
            AuthError::SessionExpired
        }
        other => AuthError::Backend(other),
    }
}
