use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::clients::{InventoryLedger, OrderStore};
use crate::config::PricingConfig;
use crate::domain::{
    new_tracking_token, next_order_id, CheckoutReceipt, CheckoutRequest, DeliveryMethod, OrderDraft, OrderLineSnapshot,
    Product,
};
use crate::error::CheckoutError;
use crate::gateway::{BackUrls, IntentItem, IntentRequest, Payer, PaymentGateway};

const SHIPPING_ITEM_TITLE: &str = "Shipping";

/// Turns a cart into a `pending` order and a payment intent.
///
/// Stock is only read here. It is decremented once the payment is confirmed.
#[derive(Clone)]
pub struct OrderCreationService {
    ledger: InventoryLedger,
    orders: OrderStore,
    gateway: Arc<dyn PaymentGateway>,
    pricing: PricingConfig,
    back_urls: BackUrls,
}

impl OrderCreationService {
    pub fn new(
        ledger: InventoryLedger,
        orders: OrderStore,
        gateway: Arc<dyn PaymentGateway>,
        pricing: PricingConfig,
        back_urls: BackUrls,
    ) -> Self {
        Self {
            ledger,
            orders,
            gateway,
            pricing,
            back_urls,
        }
    }

    #[instrument(skip(self, request), fields(items = request.items.len(), user_id = ?request.user_id))]
    pub async fn create_order(&self, request: CheckoutRequest) -> Result<CheckoutReceipt, CheckoutError> {
        validate(&request)?;

        let catalog = self.check_availability(&request).await?;

        let lines: Vec<OrderLineSnapshot> = request
            .items
            .iter()
            .map(|item| {
                let product = &catalog[&item.product_id];
                OrderLineSnapshot {
                    product_id: item.product_id.clone(),
                    name: item.name.clone().unwrap_or_else(|| product.name.clone()),
                    unit_price: product.unit_price,
                    qty: item.qty,
                    image_ref: item.image_url.clone().or_else(|| product.image_ref.clone()),
                }
            })
            .collect();

        let shipping_cost = match request.delivery.method {
            DeliveryMethod::Shipping => self.pricing.shipping_surcharge,
            DeliveryMethod::Pickup => Decimal::ZERO,
        };
        let (subtotal, total) = totals(&lines, shipping_cost)?;

        let order_id = next_order_id();
        let public_tracking_token = new_tracking_token();

        let mut items: Vec<IntentItem> = lines
            .iter()
            .map(|line| IntentItem {
                title: line.name.clone(),
                quantity: line.qty,
                unit_price: line.unit_price,
            })
            .collect();
        if shipping_cost > Decimal::ZERO {
            items.push(IntentItem {
                title: SHIPPING_ITEM_TITLE.to_string(),
                quantity: 1,
                unit_price: shipping_cost,
            });
        }

        let intent = self
            .gateway
            .create_intent(IntentRequest {
                external_reference: order_id.clone(),
                items,
                payer: Payer {
                    name: request.buyer.name.clone(),
                    email: request.buyer.email.clone(),
                },
                back_urls: self.back_urls.clone(),
            })
            .await
            .map_err(|e| {
                warn!(order_id = %order_id, error = %e, "Payment intent failed, no order created");
                CheckoutError::GatewayUnavailable(e.to_string())
            })?;

        let draft = OrderDraft {
            id: order_id,
            user_id: request.user_id,
            buyer: request.buyer,
            delivery: request.delivery,
            lines,
            subtotal,
            shipping_cost,
            total,
            public_tracking_token: public_tracking_token.clone(),
            intent_id: intent.intent_id,
        };
        let order_id = self.orders.create_order(draft).await?;

        info!(order_id = %order_id, total = %total, "Order created");
        Ok(CheckoutReceipt {
            order_id,
            payment_redirect_url: intent.redirect_url,
            public_tracking_token,
        })
    }

    /// One snapshot read of every product in the cart. Quantities for a product
    /// listed on several lines are summed before comparing with stock.
    async fn check_availability(&self, request: &CheckoutRequest) -> Result<HashMap<String, Product>, CheckoutError> {
        let mut ids: Vec<String> = Vec::new();
        let mut demand: HashMap<&str, u32> = HashMap::new();
        for item in &request.items {
            let total = demand.entry(item.product_id.as_str()).or_insert_with(|| {
                ids.push(item.product_id.clone());
                0
            });
            *total = total.saturating_add(item.qty);
        }

        let records = self.ledger.read_stock(ids.clone()).await?;

        let mut catalog = HashMap::with_capacity(ids.len());
        for (id, record) in ids.into_iter().zip(records) {
            let product = record.ok_or_else(|| CheckoutError::NotFound(format!("product {id}")))?;
            let requested = demand[id.as_str()];
            if product.stock < requested {
                return Err(CheckoutError::InsufficientStock {
                    product_id: id,
                    requested,
                    available: product.stock,
                });
            }
            catalog.insert(id, product);
        }
        Ok(catalog)
    }
}

/// Subtotal and total, refusing amounts that do not fit in a `Decimal`.
fn totals(lines: &[OrderLineSnapshot], shipping_cost: Decimal) -> Result<(Decimal, Decimal), CheckoutError> {
    let out_of_range = || CheckoutError::InvalidInput("order total is out of range".into());
    let subtotal = lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        line.unit_price
            .checked_mul(Decimal::from(line.qty))
            .and_then(|amount| acc.checked_add(amount))
            .ok_or_else(out_of_range)
    })?;
    let total = subtotal.checked_add(shipping_cost).ok_or_else(out_of_range)?;
    Ok((subtotal, total))
}

fn validate(request: &CheckoutRequest) -> Result<(), CheckoutError> {
    if !request.buyer.is_complete() {
        return Err(CheckoutError::InvalidInput("buyer name, email and phone are required".into()));
    }
    if request.items.is_empty() {
        return Err(CheckoutError::InvalidInput("cart is empty".into()));
    }
    if let Some(item) = request.items.iter().find(|item| item.product_id.trim().is_empty()) {
        return Err(CheckoutError::InvalidInput(format!("line with quantity {} has no product id", item.qty)));
    }
    if let Some(item) = request.items.iter().find(|item| item.qty == 0) {
        return Err(CheckoutError::InvalidInput(format!("quantity for {} must be positive", item.product_id)));
    }
    if request.delivery.method == DeliveryMethod::Shipping && !request.delivery.has_address() {
        return Err(CheckoutError::InvalidInput("shipping requires an address".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor_framework::ResourceActor;
    use crate::domain::{Buyer, CartLine, Delivery, Order, OrderStatus, ProductCreate};
    use crate::gateway::fake::FakeGateway;
    use rust_decimal_macros::dec;

    struct Harness {
        service: OrderCreationService,
        ledger: InventoryLedger,
        orders: OrderStore,
        gateway: Arc<FakeGateway>,
    }

    async fn harness() -> Harness {
        let (ledger_actor, ledger_client) =
            ResourceActor::<Product>::new("inventory", 16, |params: &ProductCreate| params.id.clone());
        tokio::spawn(ledger_actor.run());
        let (order_actor, order_client) = ResourceActor::<Order>::new("orders", 16, |draft: &OrderDraft| draft.id.clone());
        tokio::spawn(order_actor.run());

        let ledger = InventoryLedger::new(ledger_client);
        let orders = OrderStore::new(order_client);
        let gateway = Arc::new(FakeGateway::new());

        for (id, price, stock) in [("mate", dec!(2500), 5), ("bombilla", dec!(800), 1)] {
            ledger
                .create_product(ProductCreate {
                    id: id.into(),
                    name: id.to_uppercase(),
                    unit_price: price,
                    stock,
                    image_ref: Some(format!("{id}.png")),
                })
                .await
                .unwrap();
        }

        let service = OrderCreationService::new(
            ledger.clone(),
            orders.clone(),
            gateway.clone(),
            PricingConfig::default(),
            BackUrls::default(),
        );
        Harness {
            service,
            ledger,
            orders,
            gateway,
        }
    }

    fn buyer() -> Buyer {
        Buyer {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            phone: "1155".into(),
        }
    }

    fn request(delivery: Delivery, items: Vec<CartLine>) -> CheckoutRequest {
        CheckoutRequest {
            user_id: Some("u1".into()),
            buyer: buyer(),
            delivery,
            items,
        }
    }

    #[tokio::test]
    async fn test_creates_pending_order_with_catalog_prices() {
        let h = harness().await;
        let mut line = CartLine::new("mate", 2);
        line.name = Some("Mate imperial".into());

        let receipt = h
            .service
            .create_order(request(Delivery::shipping("Calle 1"), vec![line]))
            .await
            .unwrap();

        let order = h.orders.get_order(receipt.order_id.clone()).await.unwrap().unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.subtotal, dec!(5000));
        assert_eq!(order.shipping_cost, dec!(1500));
        assert_eq!(order.total, dec!(6500));
        assert_eq!(order.lines[0].name, "Mate imperial");
        assert_eq!(order.lines[0].image_ref.as_deref(), Some("mate.png"));
        assert_eq!(order.public_tracking_token, receipt.public_tracking_token);
        assert_eq!(order.payment.intent_id, "pref_1");
        assert!(receipt.payment_redirect_url.ends_with("pref_1"));

        // Creation never touches stock.
        assert_eq!(h.ledger.check_stock("mate".into()).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_intent_carries_order_reference_and_shipping_item() {
        let h = harness().await;
        let receipt = h
            .service
            .create_order(request(Delivery::shipping("Calle 1"), vec![CartLine::new("mate", 1)]))
            .await
            .unwrap();

        let intents = h.gateway.intents();
        assert_eq!(intents.len(), 1);
        assert_eq!(intents[0].external_reference, receipt.order_id);
        assert_eq!(intents[0].items.len(), 2);
        assert_eq!(intents[0].items[1].title, SHIPPING_ITEM_TITLE);
        assert_eq!(intents[0].items[1].unit_price, dec!(1500));
        assert_eq!(intents[0].payer.email, "ana@example.com");
    }

    #[tokio::test]
    async fn test_pickup_has_no_surcharge() {
        let h = harness().await;
        let receipt = h
            .service
            .create_order(request(Delivery::pickup(), vec![CartLine::new("bombilla", 1)]))
            .await
            .unwrap();

        let order = h.orders.get_order(receipt.order_id).await.unwrap().unwrap();
        assert_eq!(order.shipping_cost, Decimal::ZERO);
        assert_eq!(order.total, dec!(800));
        assert_eq!(h.gateway.intents()[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_total_out_of_range_is_rejected() {
        let h = harness().await;
        h.ledger
            .create_product(ProductCreate {
                id: "gold".into(),
                name: "Gold".into(),
                unit_price: Decimal::MAX,
                stock: 5,
                image_ref: None,
            })
            .await
            .unwrap();

        let service = h.service.clone();
        let result = tokio::spawn(async move {
            service
                .create_order(request(Delivery::pickup(), vec![CartLine::new("gold", 2)]))
                .await
        })
        .await
        .expect("order creation must not panic");

        assert!(matches!(result, Err(CheckoutError::InvalidInput(_))), "{result:?}");
        assert!(h.gateway.intents().is_empty());
        assert!(h.orders.orders_for_user("u1".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_surcharge_overflow_is_rejected() {
        let h = harness().await;
        h.ledger
            .create_product(ProductCreate {
                id: "gold".into(),
                name: "Gold".into(),
                unit_price: Decimal::MAX,
                stock: 5,
                image_ref: None,
            })
            .await
            .unwrap();

        let result = h
            .service
            .create_order(request(Delivery::shipping("Calle 1"), vec![CartLine::new("gold", 1)]))
            .await;
        assert!(matches!(result, Err(CheckoutError::InvalidInput(_))), "{result:?}");
    }

    #[tokio::test]
    async fn test_duplicate_lines_are_summed_for_stock_check() {
        let h = harness().await;
        let result = h
            .service
            .create_order(request(
                Delivery::pickup(),
                vec![CartLine::new("mate", 3), CartLine::new("mate", 3)],
            ))
            .await;

        assert_eq!(
            result,
            Err(CheckoutError::InsufficientStock {
                product_id: "mate".into(),
                requested: 6,
                available: 5,
            })
        );
        assert!(h.gateway.intents().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let h = harness().await;
        let result = h
            .service
            .create_order(request(Delivery::pickup(), vec![CartLine::new("ghost", 1)]))
            .await;
        assert_eq!(result, Err(CheckoutError::NotFound("product ghost".into())));
    }

    #[tokio::test]
    async fn test_invalid_inputs_persist_nothing() {
        let h = harness().await;

        let empty_cart = request(Delivery::pickup(), vec![]);
        let no_address = request(
            Delivery {
                method: DeliveryMethod::Shipping,
                address: Some("  ".into()),
            },
            vec![CartLine::new("mate", 1)],
        );
        let zero_qty = request(Delivery::pickup(), vec![CartLine::new("mate", 0)]);
        let mut no_phone = request(Delivery::pickup(), vec![CartLine::new("mate", 1)]);
        no_phone.buyer.phone.clear();

        for bad in [empty_cart, no_address, zero_qty, no_phone] {
            let result = h.service.create_order(bad).await;
            assert!(matches!(result, Err(CheckoutError::InvalidInput(_))), "{result:?}");
        }

        assert!(h.gateway.intents().is_empty());
        assert!(h.orders.orders_for_user("u1".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_gateway_failure_creates_no_order() {
        let h = harness().await;
        h.gateway.set_intents_down(true);

        let result = h
            .service
            .create_order(request(Delivery::pickup(), vec![CartLine::new("mate", 1)]))
            .await;

        assert!(matches!(result, Err(CheckoutError::GatewayUnavailable(_))));
        assert!(h.orders.orders_for_user("u1".into()).await.unwrap().is_empty());
    }
}
