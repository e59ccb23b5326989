//! Session and guard extractors.
//!
//! [`CurrentSession`] resolves the browser's [`SessionContext`] from the
//! cookie session. [`RequireAuthenticated`] and [`RequireAdmin`] run the
//! navigation guards on top of it and redirect when they deny.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use uuid::Uuid;

use super::guards::{self, GuardDecision};
use crate::error::{AppError, set_sentry_user};
use crate::gateway::AuthTokens;
use crate::models::session_keys;
use crate::services::{IdentityGateway, SessionContext};
use crate::state::AppState;
use crate::store::Store;

/// The session context of the current browser session.
///
/// Creates the context on first use and restores it from the persisted
/// tokens after it was evicted.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(current: CurrentSession) -> impl IntoResponse {
///     let state = current.store().state();
///     format!("{} orders", state.orders.len())
/// }
/// ```
#[derive(Clone)]
pub struct CurrentSession {
    key: Uuid,
    session: Session,
    context: Arc<SessionContext>,
}

impl CurrentSession {
    /// Registry key of this context.
    #[must_use]
    pub const fn key(&self) -> Uuid {
        self.key
    }

    /// The underlying cookie session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Who is signed in.
    #[must_use]
    pub fn identity(&self) -> &IdentityGateway {
        &self.context.identity
    }

    /// This session's order store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.context.store
    }

    /// Write the identity's current tokens into the cookie session, or remove
    /// them when signed out.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn persist_tokens(&self) -> Result<(), tower_sessions::session::Error> {
        match self.context.identity.tokens() {
            Some(tokens) => self.session.insert(session_keys::AUTH_TOKENS, tokens).await,
            None => {
                self.session
                    .remove::<AuthTokens>(session_keys::AUTH_TOKENS)
                    .await?;
                Ok(())
            }
        }
    }

    /// Queue a notice for the next rendered page.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn set_flash(&self, message: &str) -> Result<(), tower_sessions::session::Error> {
        self.session.insert(session_keys::FLASH, message).await
    }

    /// Take the queued notice, if any.
    pub async fn take_flash(&self) -> Option<String> {
        self.session
            .remove::<String>(session_keys::FLASH)
            .await
            .ok()
            .flatten()
    }
}

impl std::fmt::Debug for CurrentSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CurrentSession")
            .field("key", &self.key)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(current) = parts.extensions.get::<Self>() {
            return Ok(current.clone());
        }

        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or_else(|| AppError::Internal("Session layer missing".to_string()))?;

        let key = match session.get::<Uuid>(session_keys::CONTEXT_ID).await? {
            Some(key) => key,
            None => {
                let key = Uuid::new_v4();
                session.insert(session_keys::CONTEXT_ID, key).await?;
                key
            }
        };
        let persisted = session.get::<AuthTokens>(session_keys::AUTH_TOKENS).await?;

        let context = state.sessions().get_or_start(key, persisted.clone()).await;

        let current = Self {
            key,
            session,
            context,
        };

        // The listener may have refreshed or dropped the tokens since the
        // last request.
        if current.identity().tokens() != persisted {
            current.persist_tokens().await?;
        }

        if let Some(user) = current.identity().current_user() {
            set_sentry_user(&user.id.to_string(), user.email.as_deref());
        }

        parts.extensions.insert(current.clone());
        Ok(current)
    }
}

/// Rejection from a navigation guard.
#[derive(Debug)]
pub enum GuardRejection {
    /// The guard denied; go here instead.
    Redirect(&'static str),
    /// The session could not be resolved.
    Session(AppError),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Redirect(to) => Redirect::to(to).into_response(),
            Self::Session(err) => err.into_response(),
        }
    }
}

fn enforce(
    decision: GuardDecision,
    guard: &'static str,
    path: &str,
) -> Result<(), GuardRejection> {
    match decision {
        GuardDecision::Allow => Ok(()),
        GuardDecision::Redirect(to) => {
            tracing::debug!(guard, path, redirect = to, "Navigation denied");
            Err(GuardRejection::Redirect(to))
        }
    }
}

/// Extractor that requires a signed-in user.
///
/// Redirects to `/login` otherwise.
#[derive(Debug)]
pub struct RequireAuthenticated(pub CurrentSession);

impl FromRequestParts<AppState> for RequireAuthenticated {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let current = CurrentSession::from_request_parts(parts, state)
            .await
            .map_err(GuardRejection::Session)?;

        enforce(
            guards::authenticated_guard(current.identity().is_authenticated()),
            "authenticated",
            parts.uri.path(),
        )?;
        Ok(Self(current))
    }
}

/// Extractor that requires a signed-in admin.
///
/// Runs the authentication guard first (redirecting to `/login`), then the
/// admin guard (redirecting to `/`).
#[derive(Debug)]
pub struct RequireAdmin(pub CurrentSession);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuthenticated(current) =
            RequireAuthenticated::from_request_parts(parts, state).await?;

        enforce(
            guards::admin_guard(current.identity().is_admin()),
            "admin",
            parts.uri.path(),
        )?;
        Ok(Self(current))
    }
}
