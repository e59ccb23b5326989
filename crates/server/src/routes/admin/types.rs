//! View types for the admin pages.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use stitchtrack_core::{
    FieldErrors, NewOrder, Order, OrderChanges, OrderForm, OrderId, OrderStatus,
};

use crate::store::{Intent, StatusCounts};

// =============================================================================
// Query and Form Types
// =============================================================================

/// Query parameters for the dashboard.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    /// Only show orders at this status.
    pub status: Option<String>,
}

/// Status change form.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: String,
    /// `detail` to come back to the order page instead of the dashboard.
    #[serde(default)]
    pub from: Option<String>,
}

// =============================================================================
// Order Views
// =============================================================================

/// Format a timestamp the way the order pages show it, e.g. `Mar 1, 2025, 10:00 AM`.
#[must_use]
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %I:%M %p").to_string()
}

/// CSS class of the status badge.
#[must_use]
pub fn badge_class(status: OrderStatus) -> String {
    match status.badge_color() {
        Some(color) => format!("badge badge-{color}"),
        None => "badge".to_string(),
    }
}

/// An order as rendered in tables and on the info view.
#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: String,
    pub number: String,
    pub customer_name: String,
    pub phone: String,
    pub email: Option<String>,
    pub fabric: String,
    pub notes: Option<String>,
    pub status: &'static str,
    pub status_label: &'static str,
    pub badge_class: String,
    pub progress: u8,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.to_string(),
            number: order.display_number(),
            customer_name: order.customer_name.clone(),
            phone: order.phone.clone(),
            email: order.email.clone(),
            fabric: order.fabric.clone(),
            notes: order.notes.clone(),
            status: order.status.as_str(),
            status_label: order.status.label(),
            badge_class: badge_class(order.status),
            progress: order.status.progress_percent(),
            created_at: format_timestamp(order.created_at),
            updated_at: format_timestamp(order.updated_at),
        }
    }
}

/// One entry of a status `<select>`.
#[derive(Debug, Clone)]
pub struct StatusOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// All statuses, marking `current` as selected.
#[must_use]
pub fn status_options(current: Option<OrderStatus>) -> Vec<StatusOption> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusOption {
            value: status.as_str(),
            label: status.label(),
            selected: Some(status) == current,
        })
        .collect()
}

/// A dashboard filter tab.
#[derive(Debug, Clone)]
pub struct StatusTab {
    pub href: String,
    pub label: &'static str,
    pub count: usize,
    pub active: bool,
}

/// The "All" tab followed by one tab per status.
#[must_use]
pub fn status_tabs(counts: StatusCounts, active: Option<OrderStatus>) -> Vec<StatusTab> {
    let all = StatusTab {
        href: "/admin".to_string(),
        label: "All",
        count: counts.total(),
        active: active.is_none(),
    };

    std::iter::once(all)
        .chain(OrderStatus::ALL.into_iter().map(|status| StatusTab {
            href: format!("/admin?status={status}"),
            label: status.label(),
            count: counts.get(status),
            active: Some(status) == active,
        }))
        .collect()
}

// =============================================================================
// Order Dialog
// =============================================================================

/// What the order form is for.
#[derive(Debug, Clone)]
pub enum OrderDialog {
    /// A new order.
    Create,
    /// Changes to an existing order.
    Edit { id: OrderId, current: Box<Order> },
}

impl OrderDialog {
    /// Dialog heading.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Create => "New order",
            Self::Edit { .. } => "Edit order",
        }
    }

    /// Where the form posts.
    #[must_use]
    pub fn action(&self) -> String {
        match self {
            Self::Create => "/admin/orders".to_string(),
            Self::Edit { id, .. } => format!("/admin/orders/{id}/edit"),
        }
    }

    /// Where "Cancel" goes.
    #[must_use]
    pub fn cancel_href(&self) -> String {
        match self {
            Self::Create => "/admin".to_string(),
            Self::Edit { id, .. } => format!("/admin/orders/{id}"),
        }
    }

    /// The intent a valid submission dispatches.
    ///
    /// Returns `None` for an edit that changes nothing.
    #[must_use]
    pub fn intent(&self, order: NewOrder) -> Option<Intent> {
        match self {
            Self::Create => Some(Intent::CreateOrder(order)),
            Self::Edit { id, current } => {
                let changes = OrderChanges::between(current, &order);
                (!changes.is_empty()).then_some(Intent::UpdateOrder { id: *id, changes })
            }
        }
    }

    /// Form values to pre-fill.
    #[must_use]
    pub fn initial_values(&self) -> FormValues {
        match self {
            Self::Create => FormValues::default(),
            Self::Edit { current, .. } => FormValues {
                customer_name: current.customer_name.clone(),
                phone: current.phone.clone(),
                email: current.email.clone().unwrap_or_default(),
                fabric: current.fabric.clone(),
                notes: current.notes.clone().unwrap_or_default(),
                status: Some(current.status),
            },
        }
    }
}

/// Field values echoed back into the order form.
#[derive(Debug, Clone, Default)]
pub struct FormValues {
    pub customer_name: String,
    pub phone: String,
    pub email: String,
    pub fabric: String,
    pub notes: String,
    pub status: Option<OrderStatus>,
}

impl From<&OrderForm> for FormValues {
    fn from(form: &OrderForm) -> Self {
        Self {
            customer_name: form.customer_name.clone(),
            phone: form.phone.clone(),
            email: form.email.clone().unwrap_or_default(),
            fabric: form.fabric.clone(),
            notes: form.notes.clone().unwrap_or_default(),
            status: form.status.as_deref().and_then(|s| s.parse().ok()),
        }
    }
}

/// Per-field messages as the form template reads them.
#[derive(Debug, Clone, Default)]
pub struct FormErrors {
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub fabric: Option<String>,
    pub status: Option<String>,
}

impl From<&FieldErrors> for FormErrors {
    fn from(errors: &FieldErrors) -> Self {
        let field = |name: &str| errors.get(name).map(str::to_owned);
        Self {
            customer_name: field("customer_name"),
            phone: field("phone"),
            email: field("email"),
            fabric: field("fabric"),
            status: field("status"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use stitchtrack_core::OrderNumber;

    use super::*;

    fn stored() -> Order {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 10, 5, 0).unwrap();
        Order {
            id: OrderId::new(uuid::Uuid::new_v4()),
            order_number: OrderNumber::new(42),
            customer_name: "Asha".to_string(),
            phone: "555-1234".to_string(),
            email: None,
            fabric: "Silk".to_string(),
            notes: None,
            status: OrderStatus::Stitching,
            created_at: at,
            updated_at: at,
            created_by: None,
        }
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2025, 3, 1, 14, 5, 0).unwrap();
        assert_eq!(format_timestamp(at), "Mar 1, 2025, 02:05 PM");
    }

    #[test]
    fn test_badge_class() {
        assert_eq!(badge_class(OrderStatus::Shopping), "badge badge-primary");
        assert_eq!(badge_class(OrderStatus::Shipping), "badge badge-warn");
        assert_eq!(badge_class(OrderStatus::Paid), "badge");
    }

    #[test]
    fn test_order_view() {
        let view = OrderView::from(&stored());
        assert_eq!(view.number, "#42");
        assert_eq!(view.status_label, "Stitching");
        assert_eq!(view.badge_class, "badge badge-accent");
        assert_eq!(view.progress, 50);
    }

    #[test]
    fn test_status_tabs() {
        let tabs = status_tabs(StatusCounts::default(), Some(OrderStatus::Paid));
        assert_eq!(tabs.len(), 5);
        assert!(!tabs[0].active);
        assert_eq!(tabs[4].href, "/admin?status=paid");
        assert!(tabs[4].active);
    }

    #[test]
    fn test_create_dialog_always_dispatches_create() {
        let order = OrderForm {
            customer_name: "Asha".to_string(),
            phone: "555-1234".to_string(),
            fabric: "Silk".to_string(),
            ..OrderForm::default()
        }
        .validate()
        .unwrap();

        let intent = OrderDialog::Create.intent(order).unwrap();
        assert!(matches!(intent, Intent::CreateOrder(_)));
        assert_eq!(OrderDialog::Create.action(), "/admin/orders");
    }

    #[test]
    fn test_edit_dialog_sends_only_changes() {
        let current = stored();
        let dialog = OrderDialog::Edit {
            id: current.id,
            current: Box::new(current.clone()),
        };

        let unchanged = OrderForm {
            customer_name: "Asha".to_string(),
            phone: "555-1234".to_string(),
            fabric: "Silk".to_string(),
            status: Some("stitching".to_string()),
            ..OrderForm::default()
        };
        assert!(dialog.intent(unchanged.validate().unwrap()).is_none());

        let edited = OrderForm {
            fabric: "Linen".to_string(),
            ..unchanged
        };
        match dialog.intent(edited.validate().unwrap()) {
            Some(Intent::UpdateOrder { id, changes }) => {
                assert_eq!(id, current.id);
                assert_eq!(changes.fabric.as_deref(), Some("Linen"));
                assert!(changes.customer_name.is_none());
                assert!(changes.status.is_none());
            }
            other => panic!("unexpected intent: {other:?}"),
        }
        assert_eq!(dialog.action(), format!("/admin/orders/{}/edit", current.id));
    }
}
