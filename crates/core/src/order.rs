//! The order entity and its write payloads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Email, OrderId, OrderNumber, OrderStatus, Phone, UserId};

/// A tailoring order as stored by the backend.
///
/// Phone and email are kept as the stored strings: rows written before the
/// form validation existed must still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: OrderNumber,
    pub customer_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: Option<String>,
    pub fabric: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub created_by: Option<UserId>,
}

impl Order {
    /// Order number in the `#42` form used on receipts.
    #[must_use]
    pub fn display_number(&self) -> String {
        format!("#{}", self.order_number)
    }
}

/// A validated order ready to be inserted.
///
/// `requested_status` records what the caller asked for; inserts always
/// start at [`OrderStatus::Shopping`] regardless.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_name: String,
    pub phone: Phone,
    pub email: Option<Email>,
    pub fabric: String,
    pub notes: Option<String>,
    pub requested_status: Option<OrderStatus>,
}

impl NewOrder {
    /// Status every new order is written with.
    pub const INITIAL_STATUS: OrderStatus = OrderStatus::Shopping;
}

/// A partial update of an existing order.
///
/// `None` leaves a field untouched. For the nullable columns the inner
/// `Option` distinguishes "set" from "clear" and serializes to `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<Phone>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<Option<Email>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fabric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OrderStatus>,
}

impl OrderChanges {
    /// Only a status change.
    #[must_use]
    pub fn status(status: OrderStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    /// Fields of `edited` that differ from `current`.
    ///
    /// The requested status of an edit form is applied like any other field.
    #[must_use]
    pub fn between(current: &Order, edited: &NewOrder) -> Self {
        let email = edited.email.as_ref().map(Email::as_str);
        let notes = edited.notes.as_deref();

        Self {
            customer_name: (current.customer_name != edited.customer_name)
                .then(|| edited.customer_name.clone()),
            phone: (current.phone != edited.phone.as_str()).then(|| edited.phone.clone()),
            email: (current.email.as_deref() != email).then(|| edited.email.clone()),
            fabric: (current.fabric != edited.fabric).then(|| edited.fabric.clone()),
            notes: (current.notes.as_deref() != notes).then(|| edited.notes.clone()),
            status: edited
                .requested_status
                .filter(|status| *status != current.status),
        }
    }

    /// Whether applying these changes would be a no-op.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.customer_name.is_none()
            && self.phone.is_none()
            && self.email.is_none()
            && self.fabric.is_none()
            && self.notes.is_none()
            && self.status.is_none()
    }
}
