//! Checkout workflows built on the store clients and the payment gateway.

pub mod order_admin;
pub mod order_creation;
pub mod payment_confirmation;

pub use order_admin::OrderAdmin;
pub use order_creation::OrderCreationService;
pub use payment_confirmation::{ConfirmationOutcome, IgnoreReason, PaymentConfirmationHandler, PaymentNotification};
