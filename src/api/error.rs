//! HTTP mapping of checkout failures.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::CheckoutError;
use crate::order_actor::OrderError;
use crate::product_actor::ProductError;

/// Error body returned by every endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
    #[error("Already exists: {0}")]
    Conflict(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Checkout(CheckoutError::InvalidInput(rejection.body_text()))
    }
}

impl From<ProductError> for ApiError {
    fn from(e: ProductError) -> Self {
        match e {
            ProductError::AlreadyExists(id) => ApiError::Conflict(format!("product {id}")),
            other => ApiError::Checkout(other.into()),
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(e: OrderError) -> Self {
        match e {
            OrderError::AlreadyExists(id) => ApiError::Conflict(format!("order {id}")),
            other => ApiError::Checkout(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code) = match &self {
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "ALREADY_EXISTS"),
            ApiError::Checkout(e) => match e {
                CheckoutError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                CheckoutError::InsufficientStock { .. } => (StatusCode::CONFLICT, "INSUFFICIENT_STOCK"),
                CheckoutError::StatusMismatch { .. } => (StatusCode::CONFLICT, "STATUS_MISMATCH"),
                CheckoutError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                CheckoutError::GatewayUnavailable(_) => (StatusCode::BAD_GATEWAY, "GATEWAY_UNAVAILABLE"),
                CheckoutError::InventoryShortfallAtConfirmation { .. } => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INVENTORY_SHORTFALL")
                }
                CheckoutError::StoreUnavailable(detail) => {
                    error!(target: "internal", error = %detail, "Store unavailable");
                    (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE")
                }
            },
        };

        (status, Json(ErrorBody { code, message })).into_response()
    }
}
