//! Operator channel for discrepancies no buyer-facing path can resolve.

use tracing::error;

#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationAlert {
    /// A payment was approved but the order's stock is no longer available.
    InventoryShortfall {
        order_id: String,
        payment_id: String,
        detail: String,
    },
    /// A payment was approved for an order that had already been cancelled.
    PaidCancelledOrder { order_id: String, payment_id: String },
}

pub trait AlertSink: Send + Sync {
    fn raise(&self, alert: ReconciliationAlert);
}

/// Writes alerts to the `reconciliation` log target.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAlertSink;

impl AlertSink for LogAlertSink {
    fn raise(&self, alert: ReconciliationAlert) {
        match alert {
            ReconciliationAlert::InventoryShortfall {
                order_id,
                payment_id,
                detail,
            } => error!(
                target: "reconciliation",
                order_id = %order_id,
                payment_id = %payment_id,
                detail = %detail,
                "Paid order cannot be fulfilled from stock"
            ),
            ReconciliationAlert::PaidCancelledOrder { order_id, payment_id } => error!(
                target: "reconciliation",
                order_id = %order_id,
                payment_id = %payment_id,
                "Payment approved for cancelled order"
            ),
        }
    }
}
