//! Payment gateway seam.
//!
//! The checkout never trusts a notification's own claims about a payment; it asks
//! the gateway through [`PaymentGateway::get_payment`].

pub mod mercadopago;
#[cfg(test)]
pub mod fake;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

pub use mercadopago::MercadoPagoGateway;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntentItem {
    pub title: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Payer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackUrls {
    pub success: String,
    pub failure: String,
    pub pending: String,
}

/// Request to open a payment intent for one order.
#[derive(Debug, Clone, PartialEq)]
pub struct IntentRequest {
    pub external_reference: String,
    pub items: Vec<IntentItem>,
    pub payer: Payer,
    pub back_urls: BackUrls,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub intent_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentStatus {
    Approved,
    Pending,
    InProcess,
    Rejected,
    Cancelled,
    Refunded,
    ChargedBack,
    Other(String),
}

impl PaymentStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "approved" => PaymentStatus::Approved,
            "pending" => PaymentStatus::Pending,
            "in_process" => PaymentStatus::InProcess,
            "rejected" => PaymentStatus::Rejected,
            "cancelled" => PaymentStatus::Cancelled,
            "refunded" => PaymentStatus::Refunded,
            "charged_back" => PaymentStatus::ChargedBack,
            other => PaymentStatus::Other(other.to_string()),
        }
    }
}

/// Authoritative view of a payment as reported by the gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentInfo {
    pub payment_id: String,
    pub status: PaymentStatus,
    pub external_reference: Option<String>,
    pub merchant_order_id: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GatewayError {
    /// Network failure, timeout or 5xx. Worth retrying.
    #[error("Payment gateway unavailable: {0}")]
    Unavailable(String),
    /// The gateway does not know this payment id.
    #[error("Unknown payment: {0}")]
    UnknownPayment(String),
    /// The gateway refused the request (4xx other than not-found).
    #[error("Payment gateway rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Unreadable payment gateway response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError>;

    async fn get_payment(&self, payment_id: &str) -> Result<PaymentInfo, GatewayError>;
}
