use crate::domain::{OrderStatus, TransitionPatch};

/// Custom actions for Order entities.
#[derive(Debug, Clone, PartialEq)]
pub enum OrderAction {
    /// Applies `patch` and moves to `next`, but only while the order is still in
    /// `expected`. This is the idempotency gate for duplicate payment notifications.
    TransitionIfStatus {
        expected: OrderStatus,
        next: OrderStatus,
        patch: TransitionPatch,
    },
}
