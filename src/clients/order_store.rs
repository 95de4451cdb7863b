use tracing::{debug, info, instrument};

use crate::actor_framework::{Filter, ResourceClient};
use crate::domain::{Order, OrderDraft, OrderStatus, TransitionPatch};
use crate::order_actor::{OrderAction, OrderError};

/// Handle on the order store.
#[derive(Clone)]
pub struct OrderStore {
    inner: ResourceClient<Order>,
}

crate::impl_basic_client!(OrderStore, Order, OrderError, order);

impl OrderStore {
    /// Persists a `pending` order and its line snapshots in one write. The draft's
    /// id must be fresh; an existing order is never overwritten.
    #[instrument(skip(self, draft), fields(order_id = %draft.id))]
    pub async fn create_order(&self, draft: OrderDraft) -> Result<String, OrderError> {
        debug!("Sending request");
        self.inner.create(draft).await.map_err(OrderError::from)
    }

    #[instrument(skip(self))]
    pub async fn orders_for_user(&self, user_id: String) -> Result<Vec<Order>, OrderError> {
        debug!("Sending request");
        let filter = Filter::new(move |order: &Order| order.user_id.as_deref() == Some(user_id.as_str()));
        let mut orders = self.inner.find(filter).await?;
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    #[instrument(skip(self, token))]
    pub async fn order_by_tracking_token(&self, token: String) -> Result<Option<Order>, OrderError> {
        debug!("Sending request");
        let filter = Filter::new(move |order: &Order| order.public_tracking_token == token);
        Ok(self.inner.find(filter).await?.into_iter().next())
    }

    /// Moves the order to `next` only if it is still in `expected`, applying
    /// `patch` in the same write. Returns the updated order.
    #[instrument(skip(self, patch))]
    pub async fn transition_if_status(
        &self,
        id: String,
        expected: OrderStatus,
        next: OrderStatus,
        patch: TransitionPatch,
    ) -> Result<Order, OrderError> {
        debug!("Sending request");
        let order = self
            .inner
            .perform_action(id, OrderAction::TransitionIfStatus { expected, next, patch })
            .await?;
        info!(status = %order.status, "Order transitioned");
        Ok(order)
    }
}
