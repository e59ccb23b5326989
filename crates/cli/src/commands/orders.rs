//! Order commands.
//!
//! # Usage
//!
//! ```bash
//! st-cli orders list
//! st-cli orders list --status shipping
//! st-cli orders lookup --number 42
//! ST_ADMIN_EMAIL=me@example.com ST_ADMIN_PASSWORD=... st-cli orders list
//! ```
//!
//! # Environment Variables
//!
//! - `SUPABASE_URL`, `SUPABASE_KEY` - Backend project
//! - `ST_ADMIN_EMAIL`, `ST_ADMIN_PASSWORD` - Optional admin sign-in; without
//!   them requests use the anon key and see what anonymous visitors see

use std::sync::Arc;

use stitchtrack_core::{Email, Order, OrderNumber, OrderStatus, Phone};
use stitchtrack_server::config::SupabaseConfig;
use stitchtrack_server::gateway::{
    AccessToken, AuthBackend, AuthError, BackendError, OrderGateway,
};
use stitchtrack_server::supabase::{SupabaseClient, SupabaseOrders};
use thiserror::Error;

/// Errors that can occur during order commands.
#[derive(Debug, Error)]
pub enum OrdersError {
    /// Only one of email and password was given.
    #[error("Both --email and --password are needed to sign in")]
    IncompleteCredentials,

    /// Invalid argument.
    #[error("Invalid {0}: {1}")]
    InvalidArgument(&'static str, String),

    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Sign-in failed.
    #[error("Sign-in failed: {0}")]
    Auth(#[from] AuthError),

    /// Lookup found nothing.
    #[error("No order found for {0}")]
    NotFound(String),
}

/// Admin sign-in for commands that need more than the anon key.
pub struct Credentials {
    email: Email,
    password: String,
}

impl Credentials {
    /// Accept both or neither of `email` and `password`.
    ///
    /// # Errors
    ///
    /// Returns an error when only one is given or the email is malformed.
    pub fn from_args(
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Self>, OrdersError> {
        match (email, password) {
            (Some(email), Some(password)) => {
                let email = Email::parse(&email)
                    .map_err(|e| OrdersError::InvalidArgument("email", e.to_string()))?;
                Ok(Some(Self { email, password }))
            }
            (None, None) => Ok(None),
            _ => Err(OrdersError::IncompleteCredentials),
        }
    }
}

/// Bearer token obtained once at startup.
struct FixedToken(String);

impl AccessToken for FixedToken {
    fn access_token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

async fn gateway(credentials: Option<Credentials>) -> Result<Arc<dyn OrderGateway>, OrdersError> {
    dotenvy::dotenv().ok();

    let config = SupabaseConfig::from_env();
    let client = SupabaseClient::new(&config)?;

    let Some(credentials) = credentials else {
        tracing::info!("Using the anon key");
        return Ok(Arc::new(SupabaseOrders::anonymous(client)));
    };

    tracing::info!("Signing in as {}", credentials.email);
    let session = client
        .sign_in_with_password(&credentials.email, &credentials.password)
        .await?;
    let token: Arc<dyn AccessToken> = Arc::new(FixedToken(session.tokens.access_token));
    Ok(Arc::new(SupabaseOrders::with_token(client, token)))
}

/// One line of output for an order.
#[must_use]
pub fn summary(order: &Order) -> String {
    format!(
        "{:>6}  {:<10} {} | {} | {} | {}",
        order.display_number(),
        order.status.label(),
        order.customer_name,
        order.phone,
        order.fabric,
        order.created_at.format("%Y-%m-%d %H:%M"),
    )
}

/// List orders, newest first.
///
/// # Errors
///
/// Returns an error for an unknown status or a failed backend call.
pub async fn list(
    credentials: Option<Credentials>,
    status: Option<&str>,
) -> Result<(), OrdersError> {
    let status = status
        .map(str::parse::<OrderStatus>)
        .transpose()
        .map_err(|e| OrdersError::InvalidArgument("status", e.to_string()))?;

    let orders = gateway(credentials).await?.list_orders().await?;
    let shown: Vec<&Order> = orders
        .iter()
        .filter(|order| status.is_none_or(|s| order.status == s))
        .collect();

    for order in &shown {
        tracing::info!("{}", summary(order));
    }
    tracing::info!("{} of {} orders", shown.len(), orders.len());
    Ok(())
}

/// Find one order by number or phone.
///
/// # Errors
///
/// Returns [`OrdersError::NotFound`] when nothing matches, or an error for
/// malformed input or a failed backend call.
pub async fn lookup(
    credentials: Option<Credentials>,
    number: Option<&str>,
    phone: Option<&str>,
) -> Result<(), OrdersError> {
    let gateway = gateway(credentials).await?;

    let (order, label) = match (number, phone) {
        (Some(raw), _) => {
            let number = raw
                .parse::<OrderNumber>()
                .map_err(|e| OrdersError::InvalidArgument("order number", e.to_string()))?;
            (gateway.get_order_by_number(number).await?, format!("#{number}"))
        }
        (None, Some(raw)) => {
            let phone = Phone::parse(raw)
                .map_err(|e| OrdersError::InvalidArgument("phone", e.to_string()))?;
            (gateway.get_order_by_phone(&phone).await?, phone.to_string())
        }
        (None, None) => {
            return Err(OrdersError::InvalidArgument(
                "lookup",
                "pass --number or --phone".to_string(),
            ));
        }
    };

    let order = order.ok_or(OrdersError::NotFound(label))?;
    tracing::info!("{}", summary(&order));
    if let Some(email) = &order.email {
        tracing::info!("  email: {email}");
    }
    if let Some(notes) = &order.notes {
        tracing::info!("  notes: {notes}");
    }
    tracing::info!("  progress: {}%", order.status.progress_percent());
    Ok(())
}
