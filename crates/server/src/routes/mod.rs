//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                       - Liveness
//! GET  /health/ready                 - Backend reachable
//!
//! GET  /                             - Home page
//! GET  /tracking                     - Customer order lookup (?number= or ?phone=)
//!
//! # Auth
//! GET  /login                        - Login page
//! POST /login                        - Password sign-in (admins only)
//! POST /logout                       - Sign out
//!
//! # Admin (authenticated, then admin guard)
//! GET  /admin                        - Dashboard (?status= filter)
//! GET  /admin/orders/new             - Create dialog
//! POST /admin/orders                 - Create order
//! GET  /admin/orders/{id}            - Order info view
//! GET  /admin/orders/{id}/edit       - Edit dialog
//! POST /admin/orders/{id}/edit       - Save changed fields
//! POST /admin/orders/{id}/status     - Change status
//! ```

pub mod admin;
pub mod auth;
pub mod health;
pub mod home;
pub mod layout;
pub mod tracking;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::index))
        .route("/orders", post(admin::create))
        .route("/orders/new", get(admin::new_order))
        .route("/orders/{id}", get(admin::show))
        .route("/orders/{id}/edit", get(admin::edit).post(admin::update))
        .route("/orders/{id}/status", post(admin::update_status))
}

/// Create all page routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/", get(home::home))
        .route("/tracking", get(tracking::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .nest("/admin", admin_routes())
}
