//! Read-only projections of [`OrdersState`].
//!
//! The plain functions are cheap field reads. [`Selector`] wraps a derived
//! projection and recomputes only when handed a different state snapshot.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use stitchtrack_core::{Order, OrderStatus};

use super::state::OrdersState;

/// All orders in state order.
#[must_use]
pub fn select_all_orders(state: &OrdersState) -> &[Order] {
    &state.orders
}

/// The order loaded by the last single-order lookup.
#[must_use]
pub const fn select_selected_order(state: &OrdersState) -> Option<&Order> {
    state.selected_order.as_ref()
}

/// Whether a request is in flight.
#[must_use]
pub const fn select_loading(state: &OrdersState) -> bool {
    state.loading
}

/// The last failure message.
#[must_use]
pub fn select_error(state: &OrdersState) -> Option<&str> {
    state.error.as_deref()
}

/// Number of orders at each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts([usize; 4]);

impl StatusCounts {
    /// Orders at `status`.
    #[must_use]
    pub fn get(&self, status: OrderStatus) -> usize {
        self.0.get(status.position()).copied().unwrap_or_default()
    }

    /// All orders.
    #[must_use]
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

type Projector<R> = Box<dyn Fn(&OrdersState) -> R + Send + Sync>;

/// A projection memoized on the identity of the state snapshot.
///
/// The cached snapshot is kept alive with the result, so a new snapshot can
/// never reuse its address while it is cached.
pub struct Selector<R> {
    projector: Projector<R>,
    last: Mutex<Option<(Arc<OrdersState>, R)>>,
    recomputations: AtomicUsize,
}

impl<R: Clone> Selector<R> {
    /// Wrap a projection.
    pub fn new(projector: impl Fn(&OrdersState) -> R + Send + Sync + 'static) -> Self {
        Self {
            projector: Box::new(projector),
            last: Mutex::new(None),
            recomputations: AtomicUsize::new(0),
        }
    }

    /// Project `state`, reusing the previous result for the same snapshot.
    pub fn select(&self, state: &Arc<OrdersState>) -> R {
        let mut last = self.last.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((seen, result)) = last.as_ref()
            && Arc::ptr_eq(seen, state)
        {
            return result.clone();
        }

        let result = (self.projector)(state);
        self.recomputations.fetch_add(1, Ordering::Relaxed);
        *last = Some((Arc::clone(state), result.clone()));
        result
    }

    /// How many times the projection actually ran.
    #[must_use]
    pub fn recomputations(&self) -> usize {
        self.recomputations.load(Ordering::Relaxed)
    }
}

impl<R> std::fmt::Debug for Selector<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("recomputations", &self.recomputations.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

/// Orders at one status, in state order.
#[must_use]
pub fn select_orders_by_status(status: OrderStatus) -> Selector<Arc<[Order]>> {
    Selector::new(move |state| {
        state
            .orders
            .iter()
            .filter(|o| o.status == status)
            .cloned()
            .collect()
    })
}

/// Per-status order counts.
#[must_use]
pub fn select_status_counts() -> Selector<StatusCounts> {
    Selector::new(|state| {
        let mut counts = [0; 4];
        for order in &state.orders {
            if let Some(count) = counts.get_mut(order.status.position()) {
                *count += 1;
            }
        }
        StatusCounts(counts)
    })
}

/// The memoized selectors a store keeps for its views.
#[derive(Debug)]
pub struct Selectors {
    pub by_status: [Selector<Arc<[Order]>>; 4],
    pub counts: Selector<StatusCounts>,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            by_status: OrderStatus::ALL.map(select_orders_by_status),
            counts: select_status_counts(),
        }
    }
}

impl Selectors {
    /// The memoized by-status selector for `status`.
    #[must_use]
    pub const fn by_status(&self, status: OrderStatus) -> &Selector<Arc<[Order]>> {
        let [shopping, stitching, shipping, paid] = &self.by_status;
        match status {
            OrderStatus::Shopping => shopping,
            OrderStatus::Stitching => stitching,
            OrderStatus::Shipping => shipping,
            OrderStatus::Paid => paid,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::reducer::tests::order;

    fn state() -> Arc<OrdersState> {
        Arc::new(OrdersState {
            orders: vec![
                order(4, OrderStatus::Paid),
                order(3, OrderStatus::Stitching),
                order(2, OrderStatus::Stitching),
                order(1, OrderStatus::Shopping),
            ],
            ..OrdersState::default()
        })
    }

    #[test]
    fn test_plain_selectors() {
        let state = OrdersState {
            error: Some("down".to_string()),
            loading: true,
            ..OrdersState::default()
        };
        assert!(select_all_orders(&state).is_empty());
        assert!(select_selected_order(&state).is_none());
        assert!(select_loading(&state));
        assert_eq!(select_error(&state), Some("down"));
    }

    #[test]
    fn test_by_status_keeps_state_order() {
        let selector = select_orders_by_status(OrderStatus::Stitching);
        let stitching = selector.select(&state());
        let numbers: Vec<i64> = stitching.iter().map(|o| o.order_number.as_i64()).collect();
        assert_eq!(numbers, vec![3, 2]);
    }

    #[test]
    fn test_memoized_per_snapshot() {
        let selectors = Selectors::default();
        let first = state();

        let a = selectors.counts.select(&first);
        let b = selectors.counts.select(&first);
        assert_eq!(a, b);
        assert_eq!(selectors.counts.recomputations(), 1);

        let second = Arc::new((*first).clone());
        let c = selectors.counts.select(&second);
        assert_eq!(c, a);
        assert_eq!(selectors.counts.recomputations(), 2);
    }

    #[test]
    fn test_status_counts() {
        let counts = select_status_counts().select(&state());
        assert_eq!(counts.get(OrderStatus::Shopping), 1);
        assert_eq!(counts.get(OrderStatus::Stitching), 2);
        assert_eq!(counts.get(OrderStatus::Shipping), 0);
        assert_eq!(counts.get(OrderStatus::Paid), 1);
        assert_eq!(counts.total(), 4);
    }

    #[test]
    fn test_selectors_indexed_by_status() {
        let selectors = Selectors::default();
        let paid = selectors.by_status(OrderStatus::Paid).select(&state());
        assert_eq!(paid.len(), 1);
        assert_eq!(paid[0].status, OrderStatus::Paid);
    }
}
