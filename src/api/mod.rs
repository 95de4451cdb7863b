//! HTTP surface.
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | POST | /api/orders | start a checkout |
//! | GET | /api/orders/{id} | order detail |
//! | GET | /api/users/{user_id}/orders | account history |
//! | GET | /api/track/{token} | public tracking view |
//! | POST | /api/webhooks/payments | gateway notification |
//! | POST | /api/admin/orders/{id}/ship | paid → shipped |
//! | POST | /api/admin/orders/{id}/cancel | pending or paid → cancelled |
//! | POST | /api/admin/products | add a catalog record |
//! | PATCH | /api/admin/products/{id} | edit a catalog record |

mod admin;
pub mod error;
mod orders;
mod webhooks;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::clients::{InventoryLedger, OrderStore};
use crate::services::{OrderAdmin, OrderCreationService, PaymentConfirmationHandler};

pub use error::{ApiError, ApiResult, ErrorBody};
pub use orders::{TrackingLine, TrackingView};

#[derive(Clone)]
pub struct AppState {
    pub ledger: InventoryLedger,
    pub orders: OrderStore,
    pub checkout: OrderCreationService,
    pub confirmation: PaymentConfirmationHandler,
    pub admin: OrderAdmin,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/orders", post(orders::create))
        .route("/api/orders/{id}", get(orders::get_by_id))
        .route("/api/users/{user_id}/orders", get(orders::list_for_user))
        .route("/api/track/{token}", get(orders::track))
        .route("/api/webhooks/payments", post(webhooks::payment))
        .nest("/api/admin", admin_routes())
        .with_state(state)
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/{id}/ship", post(admin::ship_order))
        .route("/orders/{id}/cancel", post(admin::cancel_order))
        .route("/products", post(admin::create_product))
        .route("/products/{id}", patch(admin::update_product))
}
