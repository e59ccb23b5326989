//! Create and edit dialogs.
//!
//! Both render `admin/order_form.html`. Validation errors never reach the
//! store; a backend failure re-renders the form with the stored error.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::Path,
    response::{IntoResponse, Redirect, Response},
};
use stitchtrack_core::{Order, OrderForm, OrderId};
use tracing::instrument;

use crate::error::AppError;
use crate::filters;
use crate::middleware::{CurrentSession, RequireAdmin};
use crate::routes::layout::NavView;
use crate::store::{Intent, OrderLookup, Outcome, Store};

use super::types::{FormErrors, FormValues, OrderDialog, StatusOption, status_options};

/// Flash shown when an edit is submitted unchanged.
pub const NO_CHANGES_MESSAGE: &str = "No changes to save.";

/// Order form template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order_form.html")]
pub struct OrderFormTemplate {
    pub nav: NavView,
    pub flash: Option<String>,
    pub title: &'static str,
    pub action: String,
    pub cancel_href: String,
    pub values: FormValues,
    pub errors: FormErrors,
    /// Backend failure from the last submission.
    pub error: Option<String>,
    /// Only the edit dialog offers a status; new orders always start at the
    /// first step.
    pub show_status: bool,
    pub status_options: Vec<StatusOption>,
}

impl OrderFormTemplate {
    fn new(current: &CurrentSession, dialog: &OrderDialog, values: FormValues) -> Self {
        Self {
            nav: NavView::for_session(current),
            flash: None,
            title: dialog.title(),
            action: dialog.action(),
            cancel_href: dialog.cancel_href(),
            status_options: status_options(values.status),
            show_status: matches!(dialog, OrderDialog::Edit { .. }),
            values,
            errors: FormErrors::default(),
            error: None,
        }
    }
}

/// The order from the store's copy, loading it when the store has not seen it.
async fn find_order(store: &Store, id: OrderId) -> Result<Order, String> {
    let state = store.state();
    let cached = state
        .orders
        .iter()
        .chain(state.selected_order.as_ref())
        .find(|order| order.id == id);
    if let Some(order) = cached {
        return Ok(order.clone());
    }

    match store
        .dispatch_and_wait(Intent::LoadOrder(OrderLookup::Id(id)))
        .await
    {
        Some(Outcome::LoadOrderSuccess(order)) => Ok(order),
        Some(outcome) => Err(outcome.error().unwrap_or("Order not found").to_string()),
        None => Err("Order not found".to_string()),
    }
}

/// Submit `form` through `dialog`, rendering or redirecting on the result.
async fn submit(
    current: &CurrentSession,
    dialog: &OrderDialog,
    form: &OrderForm,
) -> Result<Response, AppError> {
    let rerender = |errors: FormErrors, error: Option<String>| {
        let mut page = OrderFormTemplate::new(current, dialog, FormValues::from(form));
        page.errors = errors;
        page.error = error;
        page.into_response()
    };

    let order = match form.validate() {
        Ok(order) => order,
        Err(errors) => return Ok(rerender(FormErrors::from(&errors), None)),
    };

    let Some(intent) = dialog.intent(order) else {
        current.set_flash(NO_CHANGES_MESSAGE).await?;
        return Ok(Redirect::to(&dialog.cancel_href()).into_response());
    };

    let outcome = current
        .store()
        .dispatch_and_wait(intent)
        .await
        .ok_or_else(|| AppError::Internal("Order request was dropped".to_string()))?;

    match outcome {
        Outcome::CreateOrderSuccess(order) => {
            tracing::info!(order_id = %order.id, number = %order.order_number, "Order created");
            current
                .set_flash(&format!("Order {} created", order.display_number()))
                .await?;
            Ok(Redirect::to("/admin").into_response())
        }
        Outcome::UpdateOrderSuccess(order) => {
            tracing::info!(order_id = %order.id, "Order updated");
            current
                .set_flash(&format!("Order {} updated", order.display_number()))
                .await?;
            Ok(Redirect::to(&format!("/admin/orders/{}", order.id)).into_response())
        }
        other => Ok(rerender(
            FormErrors::default(),
            other.error().map(str::to_owned),
        )),
    }
}

// =============================================================================
// Create
// =============================================================================

/// Display the create dialog.
pub async fn new_order(RequireAdmin(current): RequireAdmin) -> OrderFormTemplate {
    let dialog = OrderDialog::Create;
    OrderFormTemplate::new(&current, &dialog, dialog.initial_values())
}

/// Handle the create dialog submission.
#[instrument(skip(current, form), fields(session = %current.key()))]
pub async fn create(
    RequireAdmin(current): RequireAdmin,
    Form(form): Form<OrderForm>,
) -> Result<Response, AppError> {
    submit(&current, &OrderDialog::Create, &form).await
}

// =============================================================================
// Edit
// =============================================================================

async fn edit_dialog(current: &CurrentSession, id: OrderId) -> Result<OrderDialog, Response> {
    match find_order(current.store(), id).await {
        Ok(order) => Ok(OrderDialog::Edit {
            id,
            current: Box::new(order),
        }),
        Err(message) => {
            if let Err(e) = current.set_flash(&message).await {
                return Err(AppError::from(e).into_response());
            }
            Err(Redirect::to("/admin").into_response())
        }
    }
}

/// Display the edit dialog pre-filled with the order.
#[instrument(skip(current), fields(session = %current.key()))]
pub async fn edit(RequireAdmin(current): RequireAdmin, Path(id): Path<OrderId>) -> Response {
    match edit_dialog(&current, id).await {
        Ok(dialog) => {
            OrderFormTemplate::new(&current, &dialog, dialog.initial_values()).into_response()
        }
        Err(response) => response,
    }
}

/// Handle the edit dialog submission, sending only the changed fields.
#[instrument(skip(current, form), fields(session = %current.key()))]
pub async fn update(
    RequireAdmin(current): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<OrderForm>,
) -> Result<Response, AppError> {
    match edit_dialog(&current, id).await {
        Ok(dialog) => submit(&current, &dialog, &form).await,
        Err(response) => Ok(response),
    }
}
