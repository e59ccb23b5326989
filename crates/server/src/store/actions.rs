//! Intents dispatched by views and the outcomes the effect runner reports.

use stitchtrack_core::{NewOrder, Order, OrderChanges, OrderId, OrderNumber, OrderStatus, Phone};

/// How a single order is looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderLookup {
    Id(OrderId),
    Number(OrderNumber),
    Phone(Phone),
}

impl OrderLookup {
    /// Message stored when the lookup finds nothing.
    #[must_use]
    pub const fn not_found_message(&self) -> &'static str {
        match self {
            Self::Id(_) => "Order not found",
            Self::Number(_) => "Order not found. Please check your order number and try again.",
            Self::Phone(_) => {
                "No order found for this phone number. Please check the number and try again."
            }
        }
    }
}

/// A request to change or load order state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    LoadOrders,
    LoadOrder(OrderLookup),
    CreateOrder(NewOrder),
    UpdateOrderStatus { id: OrderId, status: OrderStatus },
    UpdateOrder { id: OrderId, changes: OrderChanges },
}

impl Intent {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadOrders => "load_orders",
            Self::LoadOrder(_) => "load_order",
            Self::CreateOrder(_) => "create_order",
            Self::UpdateOrderStatus { .. } => "update_order_status",
            Self::UpdateOrder { .. } => "update_order",
        }
    }
}

/// Settlement of exactly one intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    LoadOrdersSuccess(Vec<Order>),
    LoadOrdersFailure(String),
    LoadOrderSuccess(Order),
    LoadOrderFailure(String),
    CreateOrderSuccess(Order),
    CreateOrderFailure(String),
    UpdateOrderStatusSuccess(Order),
    UpdateOrderStatusFailure(String),
    UpdateOrderSuccess(Order),
    UpdateOrderFailure(String),
}

impl Outcome {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoadOrdersSuccess(_) => "load_orders_success",
            Self::LoadOrdersFailure(_) => "load_orders_failure",
            Self::LoadOrderSuccess(_) => "load_order_success",
            Self::LoadOrderFailure(_) => "load_order_failure",
            Self::CreateOrderSuccess(_) => "create_order_success",
            Self::CreateOrderFailure(_) => "create_order_failure",
            Self::UpdateOrderStatusSuccess(_) => "update_order_status_success",
            Self::UpdateOrderStatusFailure(_) => "update_order_status_failure",
            Self::UpdateOrderSuccess(_) => "update_order_success",
            Self::UpdateOrderFailure(_) => "update_order_failure",
        }
    }

    /// The failure message, if this is a failure.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::LoadOrdersFailure(e)
            | Self::LoadOrderFailure(e)
            | Self::CreateOrderFailure(e)
            | Self::UpdateOrderStatusFailure(e)
            | Self::UpdateOrderFailure(e) => Some(e.as_str()),
            _ => None,
        }
    }

    /// The order carried by a single-order success.
    #[must_use]
    pub const fn order(&self) -> Option<&Order> {
        match self {
            Self::LoadOrderSuccess(o)
            | Self::CreateOrderSuccess(o)
            | Self::UpdateOrderStatusSuccess(o)
            | Self::UpdateOrderSuccess(o) => Some(o),
            _ => None,
        }
    }
}

/// Everything the reducer folds into state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Intent(Intent),
    Outcome(Outcome),
}

impl Action {
    /// Stable name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Intent(intent) => intent.name(),
            Self::Outcome(outcome) => outcome.name(),
        }
    }
}
