//! `orders` table access through PostgREST.

use std::sync::Arc;

use async_trait::async_trait;
use stitchtrack_core::{NewOrder, Order, OrderChanges, OrderId, OrderNumber, OrderStatus, Phone};
use tracing::instrument;

use super::SupabaseClient;
use super::types::OrderInsert;
use crate::gateway::{AccessToken, BackendError, OrderGateway};

const ORDERS_PATH: &str = "/rest/v1/orders";

/// [`OrderGateway`] backed by the `orders` table.
///
/// Requests run with the access token of the bound identity when it has one
/// and with the anon key otherwise.
#[derive(Clone)]
pub struct SupabaseOrders {
    client: SupabaseClient,
    token: Option<Arc<dyn AccessToken>>,
}

impl SupabaseOrders {
    /// Gateway that always uses the anon key.
    #[must_use]
    pub const fn anonymous(client: SupabaseClient) -> Self {
        Self {
            client,
            token: None,
        }
    }

    /// Gateway acting on behalf of a signed-in user.
    #[must_use]
    pub fn with_token(client: SupabaseClient, token: Arc<dyn AccessToken>) -> Self {
        Self {
            client,
            token: Some(token),
        }
    }

    fn access_token(&self) -> Option<String> {
        self.token.as_ref().and_then(|t| t.access_token())
    }

    /// Newest row matching one `column=eq.value` filter.
    async fn first_where(&self, column: &str, value: &str) -> Result<Option<Order>, BackendError> {
        let filter = format!("eq.{value}");
        let token = self.access_token();
        let rows: Vec<Order> = self
            .client
            .get(
                ORDERS_PATH,
                &[
                    ("select", "*"),
                    (column, filter.as_str()),
                    ("order", "created_at.desc"),
                    ("limit", "1"),
                ],
                token.as_deref(),
            )
            .await?;
        Ok(rows.into_iter().next())
    }

    /// PATCH one row by id and return it.
    async fn patch_by_id(&self, id: OrderId, changes: &OrderChanges) -> Result<Order, BackendError> {
        let filter = format!("eq.{id}");
        let token = self.access_token();
        let rows: Vec<Order> = self
            .client
            .patch(
                ORDERS_PATH,
                &[("id", filter.as_str()), ("select", "*")],
                token.as_deref(),
                changes,
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(format!("order {id}")))
    }
}

impl std::fmt::Debug for SupabaseOrders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseOrders")
            .field("client", &self.client)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl OrderGateway for SupabaseOrders {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, BackendError> {
        let token = self.access_token();
        self.client
            .get(
                ORDERS_PATH,
                &[("select", "*"), ("order", "created_at.desc")],
                token.as_deref(),
            )
            .await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, BackendError> {
        self.first_where("id", &id.to_string()).await
    }

    #[instrument(skip(self), fields(order_number = %number))]
    async fn get_order_by_number(
        &self,
        number: OrderNumber,
    ) -> Result<Option<Order>, BackendError> {
        self.first_where("order_number", &number.to_string()).await
    }

    #[instrument(skip(self, phone))]
    async fn get_order_by_phone(&self, phone: &Phone) -> Result<Option<Order>, BackendError> {
        self.first_where("phone", phone.as_str()).await
    }

    #[instrument(skip(self, order))]
    async fn create_order(&self, order: &NewOrder) -> Result<Order, BackendError> {
        let token = self.access_token();
        let rows: Vec<Order> = self
            .client
            .post(
                ORDERS_PATH,
                &[("select", "*")],
                token.as_deref(),
                &OrderInsert::from(order),
            )
            .await?;

        let created = rows
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Parse("insert returned no row".to_string()))?;
        tracing::info!(order_id = %created.id, order_number = %created.order_number, "Order created");
        Ok(created)
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn update_order_status(
        &self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, BackendError> {
        self.patch_by_id(id, &OrderChanges::status(status)).await
    }

    #[instrument(skip(self, changes), fields(order_id = %id))]
    async fn update_order(
        &self,
        id: OrderId,
        changes: &OrderChanges,
    ) -> Result<Order, BackendError> {
        self.patch_by_id(id, changes).await
    }
}
