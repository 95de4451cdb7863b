use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::domain::{Buyer, Delivery, StockLine};

pub const PAYMENT_PROVIDER: &str = "mercadopago";

/// Lifecycle of an order. Moves forward only: `pending → paid → shipped`, with
/// `cancelled` reachable from `pending` or `paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Cancelled,
}

impl OrderStatus {
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Paid) | (Paid, Shipped) | (Pending, Cancelled) | (Paid, Cancelled)
        )
    }

    /// `paid` or any state reached through it.
    pub fn is_settled(self) -> bool {
        matches!(self, OrderStatus::Paid | OrderStatus::Shipped)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Immutable copy of a cart line taken when the order is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineSnapshot {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub qty: u32,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub provider: String,
    pub intent_id: String,
    pub payment_id: Option<String>,
    pub merchant_order_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

/// A buyer's checkout, from creation through fulfillment or cancellation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub user_id: Option<String>,
    pub buyer: Buyer,
    pub delivery: Delivery,
    pub lines: Vec<OrderLineSnapshot>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub public_tracking_token: String,
    pub payment: PaymentRecord,
    pub created_at: DateTime<Utc>,
    pub admin_notes: Vec<String>,
}

impl Order {
    /// Stock that a confirmed payment for this order consumes.
    pub fn stock_lines(&self) -> Vec<StockLine> {
        self.lines
            .iter()
            .map(|line| StockLine::new(line.product_id.clone(), line.qty))
            .collect()
    }
}

/// Everything needed to persist a new `pending` order.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub id: String,
    pub user_id: Option<String>,
    pub buyer: Buyer,
    pub delivery: Delivery,
    pub lines: Vec<OrderLineSnapshot>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub public_tracking_token: String,
    pub intent_id: String,
}

/// Gateway facts recorded when an order becomes `paid`.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentConfirmation {
    pub payment_id: String,
    pub merchant_order_id: Option<String>,
    pub paid_at: DateTime<Utc>,
}

/// Changes applied together with a status transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransitionPatch {
    pub confirmation: Option<PaymentConfirmation>,
    pub note: Option<String>,
}

impl TransitionPatch {
    pub fn paid(confirmation: PaymentConfirmation) -> Self {
        Self {
            confirmation: Some(confirmation),
            note: None,
        }
    }

    pub fn with_note(note: Option<String>) -> Self {
        Self {
            confirmation: None,
            note,
        }
    }
}

/// Fresh order id. Allocated before the order exists so the payment intent can
/// echo it back.
pub fn next_order_id() -> String {
    Uuid::new_v4().simple().to_string()
}
