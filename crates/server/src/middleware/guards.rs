//! Navigation guards.
//!
//! Each guard reads the current value once and decides. Neither waits for
//! the auth state to change: a session whose profile has not loaded yet is
//! simply not an admin.

/// Where a guarded navigation may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    /// Render the guarded page.
    Allow,
    /// Deny and send the browser here instead.
    Redirect(&'static str),
}

impl GuardDecision {
    /// Whether navigation proceeds.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

/// Login page, target of the authentication guard.
pub const LOGIN_PATH: &str = "/login";

/// Home page, target of the admin guard.
pub const HOME_PATH: &str = "/";

/// Allow signed-in users; send everyone else to the login page.
#[must_use]
pub const fn authenticated_guard(is_authenticated: bool) -> GuardDecision {
    if is_authenticated {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect(LOGIN_PATH)
    }
}

/// Allow admins; send everyone else home.
#[must_use]
pub const fn admin_guard(is_admin: bool) -> GuardDecision {
    if is_admin {
        GuardDecision::Allow
    } else {
        GuardDecision::Redirect(HOME_PATH)
    }
}
