use thiserror::Error;

use crate::domain::OrderStatus;
use crate::gateway::GatewayError;
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;

/// Failures of the two checkout operations.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CheckoutError {
    /// Client-correctable; nothing was written.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Client-correctable by resubmitting a smaller cart.
    #[error("Insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: u32,
        available: u32,
    },
    /// Internal idempotency signal, never shown to buyers.
    #[error("Order {order_id} is {actual}, expected {expected}")]
    StatusMismatch {
        order_id: String,
        expected: OrderStatus,
        actual: OrderStatus,
    },
    #[error("Not found: {0}")]
    NotFound(String),
    /// Transient; the caller should retry.
    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),
    /// A buyer paid for stock that is gone. Needs an operator.
    #[error("Inventory shortfall confirming order {order_id}: {detail}")]
    InventoryShortfallAtConfirmation { order_id: String, detail: String },
    /// A store actor could not be reached or refused the write for a reason the
    /// buyer cannot fix.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

impl CheckoutError {
    /// Whether a notifier should deliver the same notification again later.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CheckoutError::GatewayUnavailable(_)
                | CheckoutError::InventoryShortfallAtConfirmation { .. }
                | CheckoutError::StoreUnavailable(_)
        )
    }
}

impl From<ProductError> for CheckoutError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::NotFound(id) => CheckoutError::NotFound(format!("product {id}")),
            ProductError::InsufficientStock {
                product_id,
                requested,
                available,
            } => CheckoutError::InsufficientStock {
                product_id,
                requested,
                available,
            },
            ProductError::InvalidQuantity(qty) => CheckoutError::InvalidInput(format!("invalid quantity {qty}")),
            ProductError::ValidationError(msg) => CheckoutError::InvalidInput(msg),
            other => CheckoutError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<OrderError> for CheckoutError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::NotFound(id) => CheckoutError::NotFound(format!("order {id}")),
            OrderError::StatusMismatch {
                order_id,
                expected,
                actual,
            } => CheckoutError::StatusMismatch {
                order_id,
                expected,
                actual,
            },
            OrderError::InvalidTransition { from, to } => {
                CheckoutError::InvalidInput(format!("order cannot move from {from} to {to}"))
            }
            OrderError::ValidationError(msg) => CheckoutError::InvalidInput(msg),
            other => CheckoutError::StoreUnavailable(other.to_string()),
        }
    }
}

impl From<GatewayError> for CheckoutError {
    fn from(e: GatewayError) -> Self {
        CheckoutError::GatewayUnavailable(e.to_string())
    }
}
