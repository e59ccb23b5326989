//! Public order tracking.
//!
//! Customers look up their order by the number on their receipt or by the
//! phone number they gave at the counter. No sign-in is needed; lookups run
//! through the visitor's own session store with the anon key.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Query;
use serde::Deserialize;
use stitchtrack_core::{OrderNumber, Phone};
use tracing::instrument;

use crate::filters;
use crate::middleware::CurrentSession;
use crate::store::{Intent, OrderLookup, Outcome};

use super::admin::OrderView;
use super::layout::{NavView, ProgressStep, progress_steps};

/// Query parameters of the tracking page.
#[derive(Debug, Default, Deserialize)]
pub struct TrackingQuery {
    /// `number` or `phone`; which tab is active.
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// Which lookup the page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingMode {
    Number,
    Phone,
}

impl TrackingQuery {
    /// Active tab: `phone` when asked for or when only a phone was given.
    #[must_use]
    pub fn mode(&self) -> TrackingMode {
        match self.by.as_deref() {
            Some("phone") => TrackingMode::Phone,
            Some("number") => TrackingMode::Number,
            _ if filled(self.number.as_deref()).is_none()
                && filled(self.phone.as_deref()).is_some() =>
            {
                TrackingMode::Phone
            }
            _ => TrackingMode::Number,
        }
    }

    /// The lookup to run, `None` when the form was not submitted.
    ///
    /// # Errors
    ///
    /// Returns the field message for input that cannot be a number or phone.
    pub fn lookup(&self) -> Result<Option<OrderLookup>, String> {
        match self.mode() {
            TrackingMode::Number => filled(self.number.as_deref())
                .map(|raw| {
                    raw.parse::<OrderNumber>()
                        .ok()
                        .filter(|number| number.as_i64() > 0)
                        .map(OrderLookup::Number)
                        .ok_or_else(|| "Enter the order number from your receipt".to_string())
                })
                .transpose(),
            TrackingMode::Phone => filled(self.phone.as_deref())
                .map(|raw| {
                    Phone::parse(raw)
                        .map(OrderLookup::Phone)
                        .map_err(|_| "Enter a valid phone number".to_string())
                })
                .transpose(),
        }
    }
}

fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Tracking page template.
#[derive(Template, WebTemplate)]
#[template(path = "tracking/index.html")]
pub struct TrackingTemplate {
    pub nav: NavView,
    pub flash: Option<String>,
    pub by_phone: bool,
    pub number: String,
    pub phone: String,
    /// Message for malformed input.
    pub field_error: Option<String>,
    /// Not-found or backend error from the lookup.
    pub error: Option<String>,
    pub order: Option<OrderView>,
    pub steps: Vec<ProgressStep>,
}

/// Tracking page handler.
#[instrument(skip(current, query), fields(session = %current.key()))]
pub async fn index(
    current: CurrentSession,
    Query(query): Query<TrackingQuery>,
) -> TrackingTemplate {
    let mut page = TrackingTemplate {
        nav: NavView::for_session(&current),
        flash: current.take_flash().await,
        by_phone: query.mode() == TrackingMode::Phone,
        number: filled(query.number.as_deref()).unwrap_or_default().to_string(),
        phone: filled(query.phone.as_deref()).unwrap_or_default().to_string(),
        field_error: None,
        error: None,
        order: None,
        steps: Vec::new(),
    };

    let lookup = match query.lookup() {
        Ok(Some(lookup)) => lookup,
        Ok(None) => return page,
        Err(message) => {
            page.field_error = Some(message);
            return page;
        }
    };

    match current
        .store()
        .dispatch_and_wait(Intent::LoadOrder(lookup))
        .await
    {
        Some(Outcome::LoadOrderSuccess(order)) => {
            page.steps = progress_steps(order.status);
            page.order = Some(OrderView::from(&order));
        }
        Some(outcome) => page.error = outcome.error().map(str::to_owned),
        None => page.error = Some("Lookup failed. Please try again.".to_string()),
    }
    page
}
