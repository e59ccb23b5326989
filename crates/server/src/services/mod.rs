//! Session-scoped services.
//!
//! - [`identity`] - current user, profile and token refresh for one session
//! - [`session`] - the per-session context and its registry

pub mod identity;
pub mod session;

pub use identity::{AuthEvent, AuthSnapshot, IdentityGateway};
pub use session::{SessionContext, SessionRegistry};
