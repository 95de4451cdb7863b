use std::sync::Arc;
use tracing::{error, info};

use crate::actor_framework::ResourceActor;
use crate::alerts::AlertSink;
use crate::api::AppState;
use crate::clients::{InventoryLedger, OrderStore};
use crate::config::{AppConfig, PricingConfig};
use crate::domain::{Order, OrderDraft, Product, ProductCreate};
use crate::gateway::{BackUrls, PaymentGateway};
use crate::product_actor::ProductError;
use crate::services::{OrderAdmin, OrderCreationService, PaymentConfirmationHandler};

/// Wiring parameters for [`CheckoutSystem::new`].
#[derive(Debug, Clone)]
pub struct SystemSettings {
    pub mailbox_capacity: usize,
    pub pricing: PricingConfig,
    pub back_urls: BackUrls,
}

impl Default for SystemSettings {
    fn default() -> Self {
        Self {
            mailbox_capacity: 32,
            pricing: PricingConfig::default(),
            back_urls: BackUrls::default(),
        }
    }
}

impl From<&AppConfig> for SystemSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            mailbox_capacity: config.mailbox_capacity,
            pricing: config.pricing.clone(),
            back_urls: config.gateway.back_urls.clone(),
        }
    }
}

/// The checkout application: both store actors plus the services built on them.
///
/// Responsible for starting the actors, wiring them together, and handling shutdown.
pub struct CheckoutSystem {
    pub ledger: InventoryLedger,
    pub orders: OrderStore,
    pub checkout: OrderCreationService,
    pub confirmation: PaymentConfirmationHandler,
    pub admin: OrderAdmin,
    handles: Vec<tokio::task::JoinHandle<()>>,
}

impl CheckoutSystem {
    pub fn new(gateway: Arc<dyn PaymentGateway>, alerts: Arc<dyn AlertSink>, settings: SystemSettings) -> Self {
        // 1. Inventory ledger, keyed by the caller-chosen product id
        let (ledger_actor, ledger_client) =
            ResourceActor::<Product>::new("inventory", settings.mailbox_capacity, |params: &ProductCreate| {
                params.id.clone()
            });
        let ledger = InventoryLedger::new(ledger_client);
        let ledger_handle = tokio::spawn(ledger_actor.run());

        // 2. Order store, keyed by the id allocated before the payment intent
        let (order_actor, order_client) =
            ResourceActor::<Order>::new("orders", settings.mailbox_capacity, |draft: &OrderDraft| draft.id.clone());
        let orders = OrderStore::new(order_client);
        let order_handle = tokio::spawn(order_actor.run());

        // 3. Services share the store handles
        let checkout = OrderCreationService::new(
            ledger.clone(),
            orders.clone(),
            gateway.clone(),
            settings.pricing,
            settings.back_urls,
        );
        let confirmation = PaymentConfirmationHandler::new(gateway, ledger.clone(), orders.clone(), alerts);
        let admin = OrderAdmin::new(orders.clone());

        Self {
            ledger,
            orders,
            checkout,
            confirmation,
            admin,
            handles: vec![ledger_handle, order_handle],
        }
    }

    /// Handles for the HTTP layer.
    pub fn state(&self) -> AppState {
        AppState {
            ledger: self.ledger.clone(),
            orders: self.orders.clone(),
            checkout: self.checkout.clone(),
            confirmation: self.confirmation.clone(),
            admin: self.admin.clone(),
        }
    }

    /// Loads catalog records into the ledger. Stops at the first rejected record.
    pub async fn seed_catalog(&self, products: Vec<ProductCreate>) -> Result<usize, ProductError> {
        let count = products.len();
        for product in products {
            self.ledger.create_product(product).await?;
        }
        info!(count, "Catalog seeded");
        Ok(count)
    }

    /// Closes both mailboxes and waits for the actors to drain.
    ///
    /// Every clone of the store handles, including those inside an [`AppState`],
    /// must be dropped first or this waits forever.
    pub async fn shutdown(self) -> Result<(), String> {
        info!("Shutting down system...");

        // Drop clients to close channels
        drop(self.checkout);
        drop(self.confirmation);
        drop(self.admin);
        drop(self.ledger);
        drop(self.orders);

        for handle in self.handles {
            if let Err(e) = handle.await {
                error!("Actor task failed: {:?}", e);
                return Err(format!("Actor task failed: {:?}", e));
            }
        }

        info!("System shutdown complete.");
        Ok(())
    }
}
