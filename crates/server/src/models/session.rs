//! Session-related types.
//!
//! The cookie session only holds a context key and the auth tokens needed to
//! rebuild a session context after it was evicted. The user and profile are
//! never stored; they are looked up again from the tokens.

/// Session keys for authentication data.
pub mod keys {
    /// Key of the per-session context in the session registry.
    pub const CONTEXT_ID: &str = "context_id";

    /// Key for the signed-in user's access and refresh tokens.
    pub const AUTH_TOKENS: &str = "auth_tokens";

    /// Key for a one-time notice shown on the next page render.
    pub const FLASH: &str = "flash";
}
