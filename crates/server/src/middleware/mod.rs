//! HTTP middleware stack.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//! 4. Session layer (tower-sessions with the memory store)
//! 5. Security headers
//!
//! Guards are not layers: handlers opt in with the [`RequireAuthenticated`]
//! and [`RequireAdmin`] extractors.

pub mod auth;
pub mod guards;
pub mod request_id;
pub mod security_headers;
pub mod session;

pub use auth::{CurrentSession, GuardRejection, RequireAdmin, RequireAuthenticated};
pub use guards::{GuardDecision, admin_guard, authenticated_guard};
pub use request_id::request_id_middleware;
pub use security_headers::security_headers_middleware;
pub use session::create_session_layer;
