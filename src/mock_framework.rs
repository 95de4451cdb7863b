//! # Mock Framework
//!
//! Utilities for testing clients and services in isolation.
//!
//! Use [`create_mock_client`] to get a client and a receiver.
//! Then use helpers like [`expect_get`] or [`expect_transaction`] to assert behavior.

use chrono::Utc;
use rust_decimal_macros::dec;
use tokio::sync::mpsc;

use crate::actor_framework::{Entity, ResourceClient, ResourceRequest, Response, TransactionOutcome};
use crate::domain::{Buyer, Delivery, Order, OrderLineSnapshot, OrderStatus, PaymentRecord, PAYMENT_PROVIDER};

/// Creates a mock client and a receiver for asserting requests.
///
/// # Testing Strategy
/// Instead of spawning a `ResourceActor`, the client sends to a channel the test
/// owns. The test answers each request itself, which lets it script store
/// failures and races deterministically.
pub fn create_mock_client<T: Entity>(buffer_size: usize) -> (ResourceClient<T>, mpsc::Receiver<ResourceRequest<T>>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (ResourceClient::new(sender), receiver)
}

/// Helper to verify that the next message is a Create request
pub async fn expect_create<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::CreateParams, Response<T::Id, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Create { params, respond_to }) => Some((params, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Get request
pub async fn expect_get<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, Response<Option<T>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Get { id, respond_to }) => Some((id, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a batched Get request
pub async fn expect_get_many<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(Vec<T::Id>, Response<Vec<Option<T>>, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::GetMany { ids, respond_to }) => Some((ids, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is an Action request
pub async fn expect_action<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(T::Id, T::Action, Response<T::ActionResult, T::Error>)> {
    match receiver.recv().await {
        Some(ResourceRequest::Action { id, action, respond_to }) => Some((id, action, respond_to)),
        _ => None,
    }
}

/// Helper to verify that the next message is a Transaction request
#[allow(clippy::type_complexity)]
pub async fn expect_transaction<T: Entity>(
    receiver: &mut mpsc::Receiver<ResourceRequest<T>>,
) -> Option<(
    Option<String>,
    Vec<(T::Id, T::Action)>,
    Response<TransactionOutcome<T::ActionResult>, T::Error>,
)> {
    match receiver.recv().await {
        Some(ResourceRequest::Transaction { key, actions, respond_to }) => Some((key, actions, respond_to)),
        _ => None,
    }
}

/// A stored order with one line of two units of `mate`, in the given status.
pub fn sample_order(id: &str, status: OrderStatus) -> Order {
    Order {
        id: id.to_string(),
        user_id: None,
        buyer: Buyer {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "1155".into(),
        },
        delivery: Delivery::pickup(),
        lines: vec![OrderLineSnapshot {
            product_id: "mate".into(),
            name: "Mate".into(),
            unit_price: dec!(2500),
            qty: 2,
            image_ref: None,
        }],
        subtotal: dec!(5000),
        shipping_cost: dec!(0),
        total: dec!(5000),
        status,
        public_tracking_token: format!("token_{id}"),
        payment: PaymentRecord {
            provider: PAYMENT_PROVIDER.to_string(),
            intent_id: format!("pref_{id}"),
            payment_id: None,
            merchant_order_id: None,
            paid_at: None,
        },
        created_at: Utc::now(),
        admin_notes: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{DecrementOutcome, InventoryLedger};
    use crate::domain::{Product, StockLine};
    use crate::product_actor::{ProductAction, ProductActionResult, ProductError};

    #[tokio::test]
    async fn test_mock_client() {
        let (client, mut receiver) = create_mock_client::<Order>(10);

        let get_task = tokio::spawn(async move { client.get("o1".to_string()).await });

        let (id, responder) = expect_get(&mut receiver).await.expect("Expected Get request");
        assert_eq!(id, "o1");
        responder.send(Ok(Some(sample_order("o1", OrderStatus::Pending)))).unwrap();

        let result = get_task.await.unwrap().unwrap();
        assert_eq!(result.map(|o| o.status), Some(OrderStatus::Pending));
    }

    #[tokio::test]
    async fn test_batch_decrement_sends_one_keyed_transaction() {
        let (client, mut receiver) = create_mock_client::<Product>(10);
        let ledger = InventoryLedger::new(client);

        let task = tokio::spawn(async move {
            ledger
                .try_decrement_all("order_1", &[StockLine::new("a", 2), StockLine::new("b", 1)])
                .await
        });

        let (key, actions, responder) = expect_transaction(&mut receiver).await.expect("Expected Transaction request");
        assert_eq!(key.as_deref(), Some("order_1"));
        assert_eq!(
            actions,
            vec![
                ("a".to_string(), ProductAction::TryDecrement(2)),
                ("b".to_string(), ProductAction::TryDecrement(1)),
            ]
        );
        responder
            .send(Ok(TransactionOutcome::Committed(vec![
                ProductActionResult::TryDecrement(3),
                ProductActionResult::TryDecrement(0),
            ])))
            .unwrap();

        assert_eq!(task.await.unwrap(), Ok(DecrementOutcome::Applied));
    }

    #[tokio::test]
    async fn test_closed_store_surfaces_as_communication_error() {
        let (client, receiver) = create_mock_client::<Product>(1);
        drop(receiver);
        let ledger = InventoryLedger::new(client);

        let result = ledger.check_stock("a".into()).await;
        assert!(matches!(result, Err(ProductError::ActorCommunicationError(_))));
    }
}
