use tracing::{info, instrument};

use crate::clients::OrderStore;
use crate::domain::{Order, OrderStatus, TransitionPatch};
use crate::error::CheckoutError;

/// Operator actions on existing orders. Every change goes through the store's
/// conditional transition, so it never overwrites a concurrent confirmation.
#[derive(Clone)]
pub struct OrderAdmin {
    orders: OrderStore,
}

impl OrderAdmin {
    pub fn new(orders: OrderStore) -> Self {
        Self { orders }
    }

    #[instrument(skip(self, note))]
    pub async fn ship_order(&self, order_id: String, note: Option<String>) -> Result<Order, CheckoutError> {
        let order = self
            .orders
            .transition_if_status(order_id, OrderStatus::Paid, OrderStatus::Shipped, TransitionPatch::with_note(note))
            .await?;
        info!(order_id = %order.id, "Order shipped");
        Ok(order)
    }

    /// Cancels a `pending` or `paid` order. Stock already taken by a paid order
    /// is not returned to the ledger.
    #[instrument(skip(self, note))]
    pub async fn cancel_order(&self, order_id: String, note: Option<String>) -> Result<Order, CheckoutError> {
        let current = self
            .orders
            .get_order(order_id.clone())
            .await?
            .ok_or_else(|| CheckoutError::NotFound(format!("order {order_id}")))?;

        let order = self
            .orders
            .transition_if_status(order_id, current.status, OrderStatus::Cancelled, TransitionPatch::with_note(note))
            .await?;
        info!(order_id = %order.id, from = %current.status, "Order cancelled");
        Ok(order)
    }
}
