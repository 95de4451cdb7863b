//! Buyer-facing order endpoints.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::error::{ApiError, ApiResult};
use super::AppState;
use crate::domain::{CheckoutReceipt, CheckoutRequest, DeliveryMethod, Order, OrderStatus};
use crate::error::CheckoutError;

/// Start a checkout
#[instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<CheckoutRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CheckoutReceipt>)> {
    let Json(request) = payload?;
    let receipt = state.checkout.create_order(request).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// Get order by id
pub async fn get_by_id(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Order>> {
    let order = state
        .orders
        .get_order(id.clone())
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("order {id}")))?;
    Ok(Json(order))
}

/// Orders placed by one account, newest first
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.orders.orders_for_user(user_id).await?))
}

/// Public view of an order, reachable with the tracking token alone. Carries no
/// buyer contact data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingView {
    pub order_id: String,
    pub status: OrderStatus,
    pub delivery_method: DeliveryMethod,
    pub lines: Vec<TrackingLine>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingLine {
    pub name: String,
    pub qty: u32,
    pub unit_price: Decimal,
    pub image_ref: Option<String>,
}

impl From<Order> for TrackingView {
    fn from(order: Order) -> Self {
        Self {
            order_id: order.id,
            status: order.status,
            delivery_method: order.delivery.method,
            lines: order
                .lines
                .into_iter()
                .map(|line| TrackingLine {
                    name: line.name,
                    qty: line.qty,
                    unit_price: line.unit_price,
                    image_ref: line.image_ref,
                })
                .collect(),
            subtotal: order.subtotal,
            shipping_cost: order.shipping_cost,
            total: order.total,
            created_at: order.created_at,
            paid_at: order.payment.paid_at,
        }
    }
}

/// Look up an order by its public tracking token
pub async fn track(State(state): State<AppState>, Path(token): Path<String>) -> ApiResult<Json<TrackingView>> {
    let order = state
        .orders
        .order_by_tracking_token(token)
        .await?
        .ok_or_else(|| ApiError::from(CheckoutError::NotFound("tracking token".into())))?;
    Ok(Json(order.into()))
}
