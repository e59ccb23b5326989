//! Order info view and status change.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use stitchtrack_core::{OrderId, OrderStatus};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::RequireAdmin;
use crate::routes::layout::{NavView, ProgressStep, progress_steps};
use crate::store::{Intent, OrderLookup, Outcome};

use super::types::{OrderView, StatusForm, StatusOption, status_options};

/// Order info view template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order_detail.html")]
pub struct OrderDetailTemplate {
    pub nav: NavView,
    pub flash: Option<String>,
    pub order: OrderView,
    pub steps: Vec<ProgressStep>,
    pub status_options: Vec<StatusOption>,
}

/// Order info view handler.
///
/// Loads the order fresh; a failed load goes back to the dashboard with the
/// error as a notice.
#[instrument(skip(current), fields(session = %current.key()))]
pub async fn show(
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Response, AppError> {
    let outcome = current
        .store()
        .dispatch_and_wait(Intent::LoadOrder(OrderLookup::Id(id)))
        .await;

    match outcome {
        Some(Outcome::LoadOrderSuccess(order)) => Ok(OrderDetailTemplate {
            nav: NavView::for_session(&current),
            flash: current.take_flash().await,
            order: OrderView::from(&order),
            steps: progress_steps(order.status),
            status_options: status_options(Some(order.status)),
        }
        .into_response()),
        other => {
            let message = other
                .as_ref()
                .and_then(Outcome::error)
                .unwrap_or("Order not found");
            current.set_flash(message).await?;
            Ok(Redirect::to("/admin").into_response())
        }
    }
}

/// Where to go after a status change.
#[must_use]
pub fn status_redirect(id: OrderId, from: Option<&str>) -> String {
    match from {
        Some("detail") => format!("/admin/orders/{id}"),
        _ => "/admin".to_string(),
    }
}

/// Status change handler, used from both the dashboard rows and the info
/// view.
#[instrument(skip(current, form), fields(session = %current.key(), status = %form.status))]
pub async fn update_status(
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect, AppError> {
    let status = form
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let outcome = current
        .store()
        .dispatch_and_wait(Intent::UpdateOrderStatus { id, status })
        .await;

    let message = match &outcome {
        Some(Outcome::UpdateOrderStatusSuccess(order)) => {
            tracing::info!(order_id = %order.id, status = %order.status, "Order status changed");
            format!(
                "Order {} moved to {}",
                order.display_number(),
                order.status.label()
            )
        }
        other => other
            .as_ref()
            .and_then(Outcome::error)
            .unwrap_or("Status update failed")
            .to_string(),
    };
    current.set_flash(&message).await?;

    Ok(Redirect::to(&status_redirect(id, form.from.as_deref())))
}
