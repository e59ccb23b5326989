//! Admin dashboard: the order list with status tabs.

use std::sync::Arc;

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::Query;
use stitchtrack_core::{Order, OrderStatus};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::layout::NavView;
use crate::store::{Intent, selectors};

use super::types::{
    DashboardQuery, OrderView, StatusOption, StatusTab, status_options, status_tabs,
};

/// One table row: the order plus its inline status picker.
#[derive(Debug, Clone)]
pub struct DashboardRow {
    pub order: OrderView,
    pub options: Vec<StatusOption>,
}

impl From<&Order> for DashboardRow {
    fn from(order: &Order) -> Self {
        Self {
            order: OrderView::from(order),
            options: status_options(Some(order.status)),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavView,
    pub flash: Option<String>,
    /// Last backend failure, if the load failed.
    pub error: Option<String>,
    pub rows: Vec<DashboardRow>,
    pub tabs: Vec<StatusTab>,
    /// Label of the active filter.
    pub filter_label: Option<&'static str>,
}

/// Parse the `?status=` filter; blank means no filter.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] for an unknown status.
pub fn parse_filter(raw: Option<&str>) -> Result<Option<OrderStatus>, AppError> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<OrderStatus>())
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

/// Dashboard handler.
///
/// Reloads the order list on every visit and renders whatever the store
/// holds afterwards, including the error from a failed load.
#[instrument(skip(current), fields(session = %current.key()))]
pub async fn index(
    RequireAdmin(current): RequireAdmin,
    Query(query): Query<DashboardQuery>,
) -> Result<DashboardTemplate, AppError> {
    let filter = parse_filter(query.status.as_deref())?;

    let store = current.store();
    store.dispatch_and_wait(Intent::LoadOrders).await;
    let state = store.state();

    let filtered: Arc<[Order]>;
    let orders: &[Order] = match filter {
        Some(status) => {
            filtered = store.selectors().by_status(status).select(&state);
            &filtered
        }
        None => selectors::select_all_orders(&state),
    };
    let counts = store.selectors().counts.select(&state);

    Ok(DashboardTemplate {
        nav: NavView::for_session(&current),
        flash: current.take_flash().await,
        error: selectors::select_error(&state).map(str::to_owned),
        rows: orders.iter().map(DashboardRow::from).collect(),
        tabs: status_tabs(counts, filter),
        filter_label: filter.map(OrderStatus::label),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter() {
        assert_eq!(parse_filter(None).unwrap(), None);
        assert_eq!(parse_filter(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_filter(Some("shipping")).unwrap(),
            Some(OrderStatus::Shipping)
        );
        assert!(matches!(
            parse_filter(Some("lost")),
            Err(AppError::BadRequest(_))
        ));
    }
}
