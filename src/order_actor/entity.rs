use chrono::Utc;
use std::convert::Infallible;

use crate::actor_framework::Entity;
use crate::domain::{Order, OrderDraft, OrderStatus, PaymentRecord, PAYMENT_PROVIDER};
use super::actions::OrderAction;
use super::error::OrderError;

impl Entity for Order {
    type Id = String;
    type CreateParams = OrderDraft;
    // Orders only change through status transitions.
    type Patch = Infallible;
    type Action = OrderAction;
    type ActionResult = Order;
    type Error = OrderError;

    fn id(&self) -> &String { &self.id }

    /// Creates a `pending` Order with its line snapshots.
    ///
    /// # Notes
    /// Snapshots are copied as-is and never touched again; later catalog edits do
    /// not reach them.
    fn from_create_params(id: String, draft: OrderDraft) -> Result<Self, OrderError> {
        if draft.lines.is_empty() {
            return Err(OrderError::ValidationError("order has no lines".to_string()));
        }
        Ok(Self {
            id,
            user_id: draft.user_id,
            buyer: draft.buyer,
            delivery: draft.delivery,
            lines: draft.lines,
            subtotal: draft.subtotal,
            shipping_cost: draft.shipping_cost,
            total: draft.total,
            status: OrderStatus::Pending,
            public_tracking_token: draft.public_tracking_token,
            payment: PaymentRecord {
                provider: PAYMENT_PROVIDER.to_string(),
                intent_id: draft.intent_id,
                payment_id: None,
                merchant_order_id: None,
                paid_at: None,
            },
            created_at: Utc::now(),
            admin_notes: Vec::new(),
        })
    }

    fn on_update(&mut self, patch: Infallible) -> Result<(), OrderError> {
        match patch {}
    }

    /// Handles order-specific actions.
    ///
    /// # Errors
    /// `StatusMismatch` when the order moved on since the caller looked at it,
    /// `InvalidTransition` when the requested step would go backwards. Neither
    /// writes anything.
    fn handle_action(&mut self, action: OrderAction) -> Result<Order, OrderError> {
        match action {
            OrderAction::TransitionIfStatus { expected, next, patch } => {
                if self.status != expected {
                    return Err(OrderError::StatusMismatch {
                        order_id: self.id.clone(),
                        expected,
                        actual: self.status,
                    });
                }
                if !self.status.can_transition_to(next) {
                    return Err(OrderError::InvalidTransition { from: self.status, to: next });
                }

                if let Some(confirmation) = patch.confirmation {
                    self.payment.payment_id = Some(confirmation.payment_id);
                    self.payment.merchant_order_id = confirmation.merchant_order_id;
                    self.payment.paid_at = Some(confirmation.paid_at);
                }
                if let Some(note) = patch.note {
                    self.admin_notes.push(note);
                }
                self.status = next;
                Ok(self.clone())
            }
        }
    }
}
