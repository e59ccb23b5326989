//! Runs an intent against the order gateway and reports its outcome.
//!
//! Every backend error is turned into a failure outcome here; nothing
//! propagates past this boundary.

use stitchtrack_core::Order;

use super::actions::{Intent, OrderLookup, Outcome};
use crate::gateway::{BackendError, OrderGateway};

/// Perform the gateway call behind `intent`, exactly once.
pub async fn run(gateway: &dyn OrderGateway, intent: &Intent) -> Outcome {
    match intent {
        Intent::LoadOrders => match gateway.list_orders().await {
            Ok(orders) => Outcome::LoadOrdersSuccess(orders),
            Err(e) => Outcome::LoadOrdersFailure(message(&e)),
        },
        Intent::LoadOrder(lookup) => match load_one(gateway, lookup).await {
            Ok(Some(order)) => Outcome::LoadOrderSuccess(order),
            Ok(None) => Outcome::LoadOrderFailure(lookup.not_found_message().to_string()),
            Err(e) => Outcome::LoadOrderFailure(message(&e)),
        },
        Intent::CreateOrder(order) => match gateway.create_order(order).await {
            Ok(created) => Outcome::CreateOrderSuccess(created),
            Err(e) => Outcome::CreateOrderFailure(message(&e)),
        },
        Intent::UpdateOrderStatus { id, status } => {
            match gateway.update_order_status(*id, *status).await {
                Ok(updated) => Outcome::UpdateOrderStatusSuccess(updated),
                Err(e) => Outcome::UpdateOrderStatusFailure(message(&e)),
            }
        }
        Intent::UpdateOrder { id, changes } => match gateway.update_order(*id, changes).await {
            Ok(updated) => Outcome::UpdateOrderSuccess(updated),
            Err(e) => Outcome::UpdateOrderFailure(message(&e)),
        },
    }
}

async fn load_one(
    gateway: &dyn OrderGateway,
    lookup: &OrderLookup,
) -> Result<Option<Order>, BackendError> {
    match lookup {
        OrderLookup::Id(id) => gateway.get_order(*id).await,
        OrderLookup::Number(number) => gateway.get_order_by_number(*number).await,
        OrderLookup::Phone(phone) => gateway.get_order_by_phone(phone).await,
    }
}

/// Message shown to the user for a backend failure.
fn message(e: &BackendError) -> String {
    match e {
        BackendError::Http(_) => "Could not reach the server. Please try again.".to_string(),
        BackendError::NotConfigured => "The order service is not configured.".to_string(),
        BackendError::NotFound(_) => "Order not found".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::Utc;
    use stitchtrack_core::{
        NewOrder, OrderChanges, OrderForm, OrderId, OrderNumber, OrderStatus, Phone,
    };

    use super::*;

    /// In-memory order table. Rows are kept newest first.
    #[derive(Default)]
    pub(crate) struct FakeOrders {
        pub rows: Mutex<Vec<Order>>,
        pub fail: AtomicBool,
        pub calls: AtomicUsize,
    }

    impl FakeOrders {
        pub(crate) fn with_rows(rows: Vec<Order>) -> Self {
            Self {
                rows: Mutex::new(rows),
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(BackendError::Api {
                    status: 503,
                    message: "Service unavailable".to_string(),
                });
            }
            Ok(())
        }

        fn find(&self, pred: impl Fn(&Order) -> bool) -> Option<Order> {
            self.rows.lock().unwrap().iter().find(|o| pred(o)).cloned()
        }

        fn modify(
            &self,
            id: OrderId,
            apply: impl FnOnce(&mut Order),
        ) -> Result<Order, BackendError> {
            let mut rows = self.rows.lock().unwrap();
            let row = rows
                .iter_mut()
                .find(|o| o.id == id)
                .ok_or_else(|| BackendError::NotFound(format!("order {id}")))?;
            apply(row);
            row.updated_at = Utc::now();
            Ok(row.clone())
        }
    }

    #[async_trait]
    impl OrderGateway for FakeOrders {
        async fn list_orders(&self) -> Result<Vec<Order>, BackendError> {
            self.check()?;
            Ok(self.rows.lock().unwrap().clone())
        }

        async fn get_order(&self, id: OrderId) -> Result<Option<Order>, BackendError> {
            self.check()?;
            Ok(self.find(|o| o.id == id))
        }

        async fn get_order_by_number(
            &self,
            number: OrderNumber,
        ) -> Result<Option<Order>, BackendError> {
            self.check()?;
            Ok(self.find(|o| o.order_number == number))
        }

        async fn get_order_by_phone(&self, phone: &Phone) -> Result<Option<Order>, BackendError> {
            self.check()?;
            Ok(self.find(|o| o.phone == phone.as_str()))
        }

        async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
            self.check()?;
            let mut rows = self.rows.lock().unwrap();
            let next_number = rows
                .iter()
                .map(|o| o.order_number.as_i64())
                .max()
                .unwrap_or(0)
                + 1;
            let now = Utc::now();
            let created = Order {
                id: OrderId::new(uuid::Uuid::new_v4()),
                order_number: OrderNumber::new(next_number),
                customer_name: order.customer_name.clone(),
                phone: order.phone.as_str().to_string(),
                email: order.email.as_ref().map(|e| e.as_str().to_string()),
                fabric: order.fabric.clone(),
                notes: order.notes.clone(),
                status: NewOrder::INITIAL_STATUS,
                created_at: now,
                updated_at: now,
                created_by: None,
            };
            rows.insert(0, created.clone());
            Ok(created)
        }

        async fn update_order_status(
            &self,
            id: OrderId,
            status: OrderStatus,
        ) -> Result<Order, BackendError> {
            self.check()?;
            self.modify(id, |o| o.status = status)
        }

        async fn update_order(
            &self,
            id: OrderId,
            changes: &OrderChanges,
        ) -> Result<Order, BackendError> {
            self.check()?;
            self.modify(id, |o| {
                if let Some(name) = &changes.customer_name {
                    o.customer_name.clone_from(name);
                }
                if let Some(phone) = &changes.phone {
                    o.phone = phone.as_str().to_string();
                }
                if let Some(email) = &changes.email {
                    o.email = email.as_ref().map(|e| e.as_str().to_string());
                }
                if let Some(fabric) = &changes.fabric {
                    o.fabric.clone_from(fabric);
                }
                if let Some(notes) = &changes.notes {
                    o.notes.clone_from(notes);
                }
                if let Some(status) = changes.status {
                    o.status = status;
                }
            })
        }
    }

    pub(crate) fn asha() -> NewOrder {
        OrderForm {
            customer_name: "Asha".to_string(),
            phone: "555-1234".to_string(),
            fabric: "Silk".to_string(),
            status: Some("paid".to_string()),
            ..OrderForm::default()
        }
        .validate()
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_ignores_requested_status() {
        let gateway = FakeOrders::default();
        let outcome = run(&gateway, &Intent::CreateOrder(asha())).await;
        let created = outcome.order().unwrap();
        assert_eq!(created.status, OrderStatus::Shopping);
        assert_eq!(created.order_number, OrderNumber::new(1));
        assert!(matches!(outcome, Outcome::CreateOrderSuccess(_)));
    }

    #[tokio::test]
    async fn test_missing_number_is_failure_with_message() {
        let gateway = FakeOrders::default();
        let outcome = run(
            &gateway,
            &Intent::LoadOrder(OrderLookup::Number(OrderNumber::new(42))),
        )
        .await;
        assert_eq!(
            outcome,
            Outcome::LoadOrderFailure(
                "Order not found. Please check your order number and try again.".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_backend_error_becomes_failure() {
        let gateway = FakeOrders::default();
        gateway.fail.store(true, Ordering::SeqCst);

        let outcome = run(&gateway, &Intent::LoadOrders).await;
        assert_eq!(
            outcome,
            Outcome::LoadOrdersFailure("Service unavailable".to_string())
        );
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_update_missing_order_fails() {
        let gateway = FakeOrders::default();
        let outcome = run(
            &gateway,
            &Intent::UpdateOrderStatus {
                id: OrderId::new(uuid::Uuid::new_v4()),
                status: OrderStatus::Paid,
            },
        )
        .await;
        assert_eq!(outcome.error(), Some("Order not found"));
    }
}
