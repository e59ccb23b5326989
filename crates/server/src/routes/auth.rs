//! Login and logout.
//!
//! Only admins may stay signed in: a successful sign-in without admin rights
//! is signed out again and the form says so.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use stitchtrack_core::{FieldErrors, LoginForm};
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::filters;
use crate::gateway::AuthError;
use crate::middleware::CurrentSession;
use crate::state::AppState;

use super::layout::NavView;

/// Shown when a signed-in account has no admin profile.
pub const NOT_ADMIN_MESSAGE: &str = "You do not have admin access.";

/// Shown for backend failures during sign-in.
pub const LOGIN_FAILED_MESSAGE: &str = "Login failed. Please try again.";

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub nav: NavView,
    pub flash: Option<String>,
    /// Email echoed back after a failed attempt.
    pub email: String,
    pub email_error: Option<String>,
    pub password_error: Option<String>,
    /// Form-level error from the auth service.
    pub error: Option<String>,
}

impl LoginTemplate {
    fn new(current: &CurrentSession, flash: Option<String>) -> Self {
        Self {
            nav: NavView::for_session(current),
            flash,
            email: String::new(),
            email_error: None,
            password_error: None,
            error: None,
        }
    }

    fn with_field_errors(mut self, errors: &FieldErrors) -> Self {
        self.email_error = errors.get("email").map(str::to_owned);
        self.password_error = errors.get("password").map(str::to_owned);
        self
    }

    fn with_error(mut self, email: &str, error: impl Into<String>) -> Self {
        email.clone_into(&mut self.email);
        self.error = Some(error.into());
        self
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Sign out at the backend, dropping the local session even when that fails.
async fn sign_out(current: &CurrentSession) {
    if let Err(e) = current.identity().logout().await {
        tracing::warn!(error = %e, "Backend sign-out failed");
        current.identity().discard().await;
    }
}

/// Display the login page.
pub async fn login_page(current: CurrentSession) -> LoginTemplate {
    let flash = current.take_flash().await;
    LoginTemplate::new(&current, flash)
}

/// Handle login form submission.
///
/// Field errors and rejected credentials re-render the form; only an admin
/// sign-in redirects.
#[instrument(skip(current, form), fields(session = %current.key()))]
pub async fn login(
    current: CurrentSession,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let email = match form.validate() {
        Ok(email) => email,
        Err(errors) => {
            let mut page = LoginTemplate::new(&current, None).with_field_errors(&errors);
            form.email.trim().clone_into(&mut page.email);
            return Ok(page.into_response());
        }
    };

    match current.identity().login(&email, &form.password).await {
        Ok(_) if current.identity().is_admin() => {
            // New session id on privilege change
            current.session().cycle_id().await?;
            current.persist_tokens().await?;
            Ok(Redirect::to("/admin").into_response())
        }
        Ok(user) => {
            tracing::info!(user_id = %user.id, "Sign-in without admin rights");
            sign_out(&current).await;
            current.persist_tokens().await?;
            let page =
                LoginTemplate::new(&current, None).with_error(email.as_str(), NOT_ADMIN_MESSAGE);
            Ok(page.into_response())
        }
        Err(AuthError::InvalidCredentials(message)) => {
            let page = LoginTemplate::new(&current, None).with_error(email.as_str(), message);
            Ok(page.into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Sign-in failed");
            let page =
                LoginTemplate::new(&current, None).with_error(email.as_str(), LOGIN_FAILED_MESSAGE);
            Ok(page.into_response())
        }
    }
}

/// Sign out and drop everything this browser session held.
#[instrument(skip(state, current), fields(session = %current.key()))]
pub async fn logout(
    State(state): State<AppState>,
    current: CurrentSession,
) -> Result<Redirect, AppError> {
    sign_out(&current).await;
    current.session().flush().await?;
    state.sessions().remove(current.key()).await;
    clear_sentry_user();
    Ok(Redirect::to("/login"))
}
