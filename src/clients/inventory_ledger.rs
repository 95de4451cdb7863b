use tracing::{debug, info, instrument, warn};

use crate::actor_framework::{ResourceClient, TransactionOutcome};
use crate::domain::{Product, ProductCreate, ProductPatch, StockLine};
use crate::product_actor::{ProductAction, ProductActionResult, ProductError};

/// What a keyed batch decrement did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Every line was decremented just now.
    Applied,
    /// The same key was applied by an earlier call; stock is untouched.
    AlreadyApplied,
}

/// Handle on the inventory ledger.
///
/// Every stock mutation is a single message to the ledger actor, which evaluates
/// the sufficiency check and the write together.
#[derive(Clone)]
pub struct InventoryLedger {
    inner: ResourceClient<Product>,
}

crate::impl_basic_client!(InventoryLedger, Product, ProductError, product);

impl InventoryLedger {
    #[instrument(skip(self, product), fields(product_id = %product.id))]
    pub async fn create_product(&self, product: ProductCreate) -> Result<String, ProductError> {
        debug!("Sending request");
        self.inner.create(product).await.map_err(ProductError::from)
    }

    #[instrument(skip(self, patch))]
    pub async fn update_product(&self, id: String, patch: ProductPatch) -> Result<Product, ProductError> {
        debug!("Sending request");
        self.inner.update(id, patch).await.map_err(ProductError::from)
    }

    #[instrument(skip(self))]
    pub async fn check_stock(&self, id: String) -> Result<u32, ProductError> {
        debug!("Sending request");
        match self.inner.perform_action(id, ProductAction::CheckStock).await? {
            ProductActionResult::CheckStock(level) => Ok(level),
            other => Err(unexpected(other)),
        }
    }

    /// Reads every requested record from one snapshot, in request order.
    /// Unknown ids come back as `None`.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn read_stock(&self, ids: Vec<String>) -> Result<Vec<Option<Product>>, ProductError> {
        debug!("Sending request");
        self.inner.get_many(ids).await.map_err(ProductError::from)
    }

    /// Removes `qty` units from one product, returning what is left.
    #[instrument(skip(self))]
    pub async fn try_decrement(&self, id: String, qty: u32) -> Result<u32, ProductError> {
        debug!("Sending request");
        if qty == 0 {
            return Err(ProductError::InvalidQuantity(qty));
        }
        match self.inner.perform_action(id, ProductAction::TryDecrement(qty)).await? {
            ProductActionResult::TryDecrement(remaining) => Ok(remaining),
            other => Err(unexpected(other)),
        }
    }

    /// Decrements every line or none of them.
    ///
    /// `key` identifies the business operation (the order id). Once a call with a
    /// key commits, later calls with the same key change nothing and report
    /// [`DecrementOutcome::AlreadyApplied`]. A call that fails leaves the key
    /// unused, so it can be retried.
    #[instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn try_decrement_all(&self, key: &str, lines: &[StockLine]) -> Result<DecrementOutcome, ProductError> {
        debug!("Sending request");
        if let Some(line) = lines.iter().find(|line| line.qty == 0) {
            warn!(product_id = %line.product_id, "Rejecting zero-quantity line");
            return Err(ProductError::InvalidQuantity(0));
        }

        let actions = lines
            .iter()
            .map(|line| (line.product_id.clone(), ProductAction::TryDecrement(line.qty)))
            .collect();

        match self.inner.transact(Some(key.to_string()), actions).await? {
            TransactionOutcome::Committed(_) => {
                info!("Stock decremented");
                Ok(DecrementOutcome::Applied)
            }
            TransactionOutcome::AlreadyCommitted => {
                info!("Stock already decremented for this key");
                Ok(DecrementOutcome::AlreadyApplied)
            }
        }
    }
}

fn unexpected(result: ProductActionResult) -> ProductError {
    ProductError::ActorCommunicationError(format!("Unexpected result: {result:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use rust_decimal_macros::dec;

    fn spawn_ledger() -> InventoryLedger {
        let (actor, client) = ResourceActor::<Product>::new("inventory", 16, |params: &ProductCreate| params.id.clone());
        tokio::spawn(actor.run());
        InventoryLedger::new(client)
    }

    async fn stock(ledger: &InventoryLedger, id: &str, stock: u32) {
        ledger
            .create_product(ProductCreate {
                id: id.into(),
                name: id.to_uppercase(),
                unit_price: dec!(100),
                stock,
                image_ref: None,
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_unknown_product_decrement() {
        let ledger = spawn_ledger();
        let result = ledger.try_decrement("ghost".into(), 1).await;
        assert_eq!(result, Err(ProductError::NotFound("ghost".into())));
    }

    #[tokio::test]
    async fn test_batch_decrement_is_all_or_nothing() {
        let ledger = spawn_ledger();
        stock(&ledger, "a", 5).await;
        stock(&ledger, "b", 2).await;
        stock(&ledger, "c", 9).await;

        let lines = [StockLine::new("a", 1), StockLine::new("b", 3), StockLine::new("c", 1)];
        let result = ledger.try_decrement_all("order_1", &lines).await;
        assert_eq!(
            result,
            Err(ProductError::InsufficientStock {
                product_id: "b".into(),
                requested: 3,
                available: 2,
            })
        );

        for (id, expected) in [("a", 5), ("b", 2), ("c", 9)] {
            assert_eq!(ledger.check_stock(id.into()).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn test_batch_decrement_applies_once_per_key() {
        let ledger = spawn_ledger();
        stock(&ledger, "a", 5).await;

        let lines = [StockLine::new("a", 3)];
        assert_eq!(ledger.try_decrement_all("order_1", &lines).await, Ok(DecrementOutcome::Applied));
        assert_eq!(ledger.try_decrement_all("order_1", &lines).await, Ok(DecrementOutcome::AlreadyApplied));
        assert_eq!(ledger.check_stock("a".into()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_decrements_never_oversell() {
        let ledger = spawn_ledger();
        stock(&ledger, "a", 10).await;

        let attempts: Vec<_> = (0..25)
            .map(|_| {
                let ledger = ledger.clone();
                tokio::spawn(async move { ledger.try_decrement("a".into(), 1).await })
            })
            .collect();

        let mut succeeded = 0;
        for attempt in attempts {
            if attempt.await.unwrap().is_ok() {
                succeeded += 1;
            }
        }
        assert_eq!(succeeded, 10);
        assert_eq!(ledger.check_stock("a".into()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_read_stock_preserves_order() {
        let ledger = spawn_ledger();
        stock(&ledger, "a", 1).await;
        stock(&ledger, "b", 2).await;

        let records = ledger.read_stock(vec!["b".into(), "ghost".into(), "a".into()]).await.unwrap();
        let stocks: Vec<Option<u32>> = records.iter().map(|r| r.as_ref().map(|p| p.stock)).collect();
        assert_eq!(stocks, vec![Some(2), None, Some(1)]);
    }
}
