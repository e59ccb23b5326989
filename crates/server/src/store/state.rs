//! Order state held per browser session.

use stitchtrack_core::Order;

/// Possibly-stale copy of the backend's orders plus request bookkeeping.
///
/// `orders` keeps fetch/insertion order and is never re-sorted here.
/// `loading` is true between an intent and its outcome; `error` holds the
/// last failure until the next intent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdersState {
    pub orders: Vec<Order>,
    pub selected_order: Option<Order>,
    pub loading: bool,
    pub error: Option<String>,
}
