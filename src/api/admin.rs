//! Operator endpoints for orders and catalog records.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::error::ApiResult;
use super::AppState;
use crate::domain::{Order, Product, ProductCreate, ProductPatch};
use crate::error::CheckoutError;

/// Optional note appended to the order when its status changes.
#[derive(Debug, Default, Deserialize)]
pub struct StatusNote {
    #[serde(default)]
    pub note: Option<String>,
}

/// The body is optional; a request without a JSON content type carries no note.
fn note(payload: Result<Json<StatusNote>, JsonRejection>) -> ApiResult<Option<String>> {
    let body = match payload {
        Ok(Json(body)) => body,
        Err(JsonRejection::MissingJsonContentType(_)) => StatusNote::default(),
        Err(rejection) => return Err(rejection.into()),
    };
    Ok(body.note.filter(|note| !note.trim().is_empty()))
}

/// Mark a paid order as shipped
pub async fn ship_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusNote>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.admin.ship_order(id, note(payload)?).await?))
}

/// Cancel a pending or paid order
pub async fn cancel_order(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<StatusNote>, JsonRejection>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.admin.cancel_order(id, note(payload)?).await?))
}

/// Add a product to the catalog
pub async fn create_product(
    State(state): State<AppState>,
    payload: Result<Json<ProductCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    let Json(params) = payload?;
    let id = state.ledger.create_product(params).await?;
    let product = state
        .ledger
        .get_product(id.clone())
        .await?
        .ok_or_else(|| CheckoutError::NotFound(format!("product {id}")))?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// Edit a catalog record, including setting stock to an absolute level
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    let Json(patch) = payload?;
    Ok(Json(state.ledger.update_product(id, patch).await?))
}
