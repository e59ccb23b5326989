//! Pure state transitions.

use stitchtrack_core::Order;

use super::actions::{Action, Intent, Outcome};
use super::state::OrdersState;

/// Fold one action into the previous state, returning the next state.
#[must_use]
pub fn reduce(state: &OrdersState, action: &Action) -> OrdersState {
    match action {
        Action::Intent(intent) => OrdersState {
            loading: true,
            error: None,
            selected_order: match intent {
                Intent::LoadOrder(_) => None,
                _ => state.selected_order.clone(),
            },
            ..state.clone()
        },

        Action::Outcome(outcome) => match outcome {
            Outcome::LoadOrdersSuccess(orders) => OrdersState {
                orders: orders.clone(),
                loading: false,
                error: None,
                ..state.clone()
            },
            Outcome::LoadOrderSuccess(order) => OrdersState {
                selected_order: Some(order.clone()),
                loading: false,
                error: None,
                ..state.clone()
            },
            Outcome::CreateOrderSuccess(order) => {
                let mut orders = Vec::with_capacity(state.orders.len() + 1);
                orders.push(order.clone());
                orders.extend(state.orders.iter().cloned());
                OrdersState {
                    orders,
                    loading: false,
                    error: None,
                    ..state.clone()
                }
            }
            Outcome::UpdateOrderStatusSuccess(order) | Outcome::UpdateOrderSuccess(order) => {
                OrdersState {
                    orders: replace_by_id(&state.orders, order),
                    selected_order: match &state.selected_order {
                        Some(selected) if selected.id == order.id => Some(order.clone()),
                        other => other.clone(),
                    },
                    loading: false,
                    error: None,
                }
            }
            Outcome::LoadOrdersFailure(error)
            | Outcome::LoadOrderFailure(error)
            | Outcome::CreateOrderFailure(error)
            | Outcome::UpdateOrderStatusFailure(error)
            | Outcome::UpdateOrderFailure(error) => OrdersState {
                loading: false,
                error: Some(error.clone()),
                ..state.clone()
            },
        },
    }
}

fn replace_by_id(orders: &[Order], updated: &Order) -> Vec<Order> {
    orders
        .iter()
        .map(|o| {
            if o.id == updated.id {
                updated.clone()
            } else {
                o.clone()
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use chrono::{TimeZone, Utc};
    use stitchtrack_core::{OrderForm, OrderId, OrderNumber, OrderStatus, Phone};

    use super::*;
    use crate::store::actions::OrderLookup;

    pub(crate) fn order(number: i64, status: OrderStatus) -> Order {
        let created = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap()
            + chrono::Duration::minutes(number);
        Order {
            id: OrderId::new(uuid::Uuid::new_v4()),
            order_number: OrderNumber::new(number),
            customer_name: format!("Customer {number}"),
            phone: "555-1234".to_string(),
            email: None,
            fabric: "Silk".to_string(),
            notes: None,
            status,
            created_at: created,
            updated_at: created,
            created_by: None,
        }
    }

    fn loaded(orders: Vec<Order>) -> OrdersState {
        OrdersState {
            orders,
            ..OrdersState::default()
        }
    }

    fn new_order() -> stitchtrack_core::NewOrder {
        OrderForm {
            customer_name: "Asha".to_string(),
            phone: "555-1234".to_string(),
            fabric: "Silk".to_string(),
            ..OrderForm::default()
        }
        .validate()
        .unwrap()
    }

    #[test]
    fn test_every_intent_sets_loading_and_clears_error() {
        let failed = OrdersState {
            error: Some("boom".to_string()),
            ..OrdersState::default()
        };
        let intents = [
            Intent::LoadOrders,
            Intent::LoadOrder(OrderLookup::Number(OrderNumber::new(1))),
            Intent::CreateOrder(new_order()),
            Intent::UpdateOrderStatus {
                id: OrderId::new(uuid::Uuid::new_v4()),
                status: OrderStatus::Paid,
            },
            Intent::UpdateOrder {
                id: OrderId::new(uuid::Uuid::new_v4()),
                changes: stitchtrack_core::OrderChanges::default(),
            },
        ];

        for intent in intents {
            let next = reduce(&failed, &Action::Intent(intent));
            assert!(next.loading);
            assert_eq!(next.error, None);
        }
    }

    #[test]
    fn test_load_one_intent_clears_selected_only() {
        let a = order(1, OrderStatus::Shopping);
        let state = OrdersState {
            orders: vec![a.clone()],
            selected_order: Some(a),
            ..OrdersState::default()
        };

        let next = reduce(
            &state,
            &Action::Intent(Intent::LoadOrder(OrderLookup::Number(OrderNumber::new(1)))),
        );
        assert_eq!(next.selected_order, None);
        assert_eq!(next.orders, state.orders);

        let next = reduce(&state, &Action::Intent(Intent::LoadOrders));
        assert_eq!(next.selected_order, state.selected_order);
    }

    #[test]
    fn test_load_success_replaces_sequence() {
        let state = loaded(vec![order(1, OrderStatus::Shopping)]);
        let fresh = vec![order(3, OrderStatus::Paid), order(2, OrderStatus::Stitching)];
        let next = reduce(
            &state,
            &Action::Outcome(Outcome::LoadOrdersSuccess(fresh.clone())),
        );
        assert_eq!(next.orders, fresh);
        assert!(!next.loading);
    }

    #[test]
    fn test_create_success_prepends() {
        let state = OrdersState {
            loading: true,
            ..loaded(vec![order(1, OrderStatus::Paid), order(2, OrderStatus::Shipping)])
        };
        let created = order(3, OrderStatus::Shopping);

        let next = reduce(
            &state,
            &Action::Outcome(Outcome::CreateOrderSuccess(created.clone())),
        );
        assert_eq!(next.orders.len(), 3);
        assert_eq!(next.orders[0], created);
        assert_eq!(next.orders[1..], state.orders[..]);
        assert!(!next.loading);
        assert_eq!(next.error, None);
    }

    #[test]
    fn test_update_replaces_exactly_one_by_id() {
        let orders = vec![
            order(1, OrderStatus::Shopping),
            order(2, OrderStatus::Shopping),
            order(3, OrderStatus::Shopping),
        ];
        let state = OrdersState {
            selected_order: Some(orders[1].clone()),
            ..loaded(orders.clone())
        };
        let updated = Order {
            status: OrderStatus::Shipping,
            ..orders[1].clone()
        };

        let next = reduce(
            &state,
            &Action::Outcome(Outcome::UpdateOrderStatusSuccess(updated.clone())),
        );
        assert_eq!(next.orders[0], orders[0]);
        assert_eq!(next.orders[1], updated);
        assert_eq!(next.orders[2], orders[2]);
        assert_eq!(next.selected_order, Some(updated));
    }

    #[test]
    fn test_update_leaves_other_selected_order() {
        let orders = vec![order(1, OrderStatus::Shopping), order(2, OrderStatus::Shopping)];
        let state = OrdersState {
            selected_order: Some(orders[0].clone()),
            ..loaded(orders.clone())
        };
        let updated = Order {
            fabric: "Linen".to_string(),
            ..orders[1].clone()
        };

        let next = reduce(
            &state,
            &Action::Outcome(Outcome::UpdateOrderSuccess(updated)),
        );
        assert_eq!(next.selected_order, Some(orders[0].clone()));
    }

    #[test]
    fn test_update_without_match_is_noop() {
        let state = loaded(vec![order(1, OrderStatus::Shopping)]);
        let stranger = order(9, OrderStatus::Paid);

        let next = reduce(
            &state,
            &Action::Outcome(Outcome::UpdateOrderSuccess(stranger)),
        );
        assert_eq!(next.orders, state.orders);
    }

    #[test]
    fn test_failure_keeps_orders_and_selected() {
        let a = order(1, OrderStatus::Shopping);
        let state = OrdersState {
            orders: vec![a.clone()],
            selected_order: Some(a),
            loading: true,
            error: None,
        };

        for outcome in [
            Outcome::LoadOrdersFailure("down".to_string()),
            Outcome::LoadOrderFailure("Order not found".to_string()),
            Outcome::CreateOrderFailure("down".to_string()),
            Outcome::UpdateOrderStatusFailure("down".to_string()),
            Outcome::UpdateOrderFailure("down".to_string()),
        ] {
            let message = outcome.error().unwrap().to_string();
            let next = reduce(&state, &Action::Outcome(outcome));
            assert_eq!(next.orders, state.orders);
            assert_eq!(next.selected_order, state.selected_order);
            assert!(!next.loading);
            assert_eq!(next.error, Some(message));
        }
    }

    #[test]
    fn test_phone_lookup_message() {
        let lookup = OrderLookup::Phone(Phone::parse("555-1234").unwrap());
        assert!(lookup.not_found_message().contains("phone number"));
    }
}
