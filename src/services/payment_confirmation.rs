use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::alerts::{AlertSink, ReconciliationAlert};
use crate::clients::{DecrementOutcome, InventoryLedger, OrderStore};
use crate::domain::{Order, OrderStatus, PaymentConfirmation, TransitionPatch};
use crate::error::CheckoutError;
use crate::gateway::{GatewayError, PaymentGateway, PaymentInfo, PaymentStatus};
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;

/// A payment notification reduced to the one field the handler trusts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentNotification {
    pub payment_id: Option<String>,
}

impl PaymentNotification {
    pub fn new(payment_id: impl Into<String>) -> Self {
        Self {
            payment_id: Some(payment_id.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    MissingPaymentId,
    UnknownPayment,
    MissingReference,
    UnknownOrder,
    CancelledOrder,
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            IgnoreReason::MissingPaymentId => "missing payment id",
            IgnoreReason::UnknownPayment => "unknown payment",
            IgnoreReason::MissingReference => "payment has no order reference",
            IgnoreReason::UnknownOrder => "unknown order",
            IgnoreReason::CancelledOrder => "order is cancelled",
        };
        f.write_str(label)
    }
}

/// Every outcome here acknowledges the notification. Only an `Err` asks for a
/// redelivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// Stock was decremented and the order moved to `paid` by this call.
    Confirmed { order_id: String },
    /// An earlier delivery already settled this order.
    AlreadyProcessed { order_id: String },
    /// The gateway does not report the payment as approved yet.
    NotApproved,
    Ignored(IgnoreReason),
}

/// Settles orders from gateway notifications.
///
/// Safe to run any number of times, concurrently, for the same payment: the
/// ledger decrement is keyed by order id and the `pending → paid` transition is
/// conditional, so at most one delivery changes anything.
#[derive(Clone)]
pub struct PaymentConfirmationHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: InventoryLedger,
    orders: OrderStore,
    alerts: Arc<dyn AlertSink>,
}

impl PaymentConfirmationHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: InventoryLedger,
        orders: OrderStore,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            gateway,
            ledger,
            orders,
            alerts,
        }
    }

    #[instrument(skip(self), fields(payment_id = ?notification.payment_id))]
    pub async fn handle_notification(
        &self,
        notification: PaymentNotification,
    ) -> Result<ConfirmationOutcome, CheckoutError> {
        let Some(payment_id) = notification.payment_id.filter(|id| !id.trim().is_empty()) else {
            debug!("Notification without payment id");
            return Ok(ConfirmationOutcome::Ignored(IgnoreReason::MissingPaymentId));
        };

        let payment = match self.gateway.get_payment(&payment_id).await {
            Ok(payment) => payment,
            Err(GatewayError::UnknownPayment(_)) => {
                info!("Gateway does not know this payment");
                return Ok(ConfirmationOutcome::Ignored(IgnoreReason::UnknownPayment));
            }
            Err(e) => {
                warn!(error = %e, "Payment lookup failed");
                return Err(e.into());
            }
        };

        if payment.status != PaymentStatus::Approved {
            debug!(status = ?payment.status, "Payment not approved");
            return Ok(ConfirmationOutcome::NotApproved);
        }

        let Some(order_id) = payment.external_reference.clone() else {
            warn!("Approved payment without order reference");
            return Ok(ConfirmationOutcome::Ignored(IgnoreReason::MissingReference));
        };

        let Some(order) = self.orders.get_order(order_id.clone()).await? else {
            warn!(order_id = %order_id, "Approved payment for unknown order");
            return Ok(ConfirmationOutcome::Ignored(IgnoreReason::UnknownOrder));
        };

        match order.status {
            OrderStatus::Pending => self.settle(order, payment).await,
            status if status.is_settled() => {
                debug!(order_id = %order_id, "Order already settled");
                Ok(ConfirmationOutcome::AlreadyProcessed { order_id })
            }
            _ => Ok(self.paid_cancelled_order(order_id, payment.payment_id)),
        }
    }

    async fn settle(&self, order: Order, payment: PaymentInfo) -> Result<ConfirmationOutcome, CheckoutError> {
        match self.ledger.try_decrement_all(&order.id, &order.stock_lines()).await {
            Ok(DecrementOutcome::Applied) => {}
            Ok(DecrementOutcome::AlreadyApplied) => {
                info!(order_id = %order.id, "Stock was decremented by an earlier delivery");
            }
            Err(e @ (ProductError::InsufficientStock { .. } | ProductError::NotFound(_))) => {
                let detail = e.to_string();
                self.alerts.raise(ReconciliationAlert::InventoryShortfall {
                    order_id: order.id.clone(),
                    payment_id: payment.payment_id.clone(),
                    detail: detail.clone(),
                });
                return Err(CheckoutError::InventoryShortfallAtConfirmation {
                    order_id: order.id,
                    detail,
                });
            }
            Err(e) => return Err(e.into()),
        }

        let patch = TransitionPatch::paid(PaymentConfirmation {
            payment_id: payment.payment_id.clone(),
            merchant_order_id: payment.merchant_order_id.clone(),
            paid_at: Utc::now(),
        });
        match self
            .orders
            .transition_if_status(order.id.clone(), OrderStatus::Pending, OrderStatus::Paid, patch)
            .await
        {
            Ok(_) => {
                info!(order_id = %order.id, payment_id = %payment.payment_id, "Order paid");
                Ok(ConfirmationOutcome::Confirmed { order_id: order.id })
            }
            Err(OrderError::StatusMismatch { actual, .. }) if actual.is_settled() => {
                debug!(order_id = %order.id, "Concurrent delivery settled the order first");
                Ok(ConfirmationOutcome::AlreadyProcessed { order_id: order.id })
            }
            Err(OrderError::StatusMismatch {
                actual: OrderStatus::Cancelled,
                ..
            }) => Ok(self.paid_cancelled_order(order.id, payment.payment_id)),
            Err(e) => Err(e.into()),
        }
    }

    fn paid_cancelled_order(&self, order_id: String, payment_id: String) -> ConfirmationOutcome {
        warn!(order_id = %order_id, "Approved payment for cancelled order");
        self.alerts
            .raise(ReconciliationAlert::PaidCancelledOrder { order_id, payment_id });
        ConfirmationOutcome::Ignored(IgnoreReason::CancelledOrder)
    }
}
