//! Payment gateway notifications.
//!
//! The gateway redelivers any notification that does not get a 2xx, so the status
//! code is the only thing that matters here: `200` acknowledges, `500` or `503`
//! asks for a retry.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, error, instrument, warn};

use super::AppState;
use crate::error::CheckoutError;
use crate::services::PaymentNotification;

#[instrument(skip_all)]
pub async fn payment(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
    body: Bytes,
) -> StatusCode {
    let topic = params.get("type").or_else(|| params.get("topic"));
    if let Some(topic) = topic.filter(|topic| topic.as_str() != "payment") {
        debug!(topic = %topic, "Ignoring non-payment notification");
        return StatusCode::OK;
    }

    let notification = PaymentNotification {
        payment_id: payment_id(&params, &body),
    };
    match state.confirmation.handle_notification(notification).await {
        Ok(outcome) => {
            debug!(?outcome, "Notification handled");
            StatusCode::OK
        }
        Err(e @ CheckoutError::StoreUnavailable(_)) => {
            error!(error = %e, "Notification not processed");
            StatusCode::SERVICE_UNAVAILABLE
        }
        Err(e) => {
            warn!(error = %e, retryable = e.is_retryable(), "Notification not processed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Payment id from `?data.id=`, `?id=`, or a JSON body `{"data": {"id": ...}}`.
/// The id may be a string or a number in the body.
fn payment_id(params: &HashMap<String, String>, body: &[u8]) -> Option<String> {
    if let Some(id) = params.get("data.id").or_else(|| params.get("id")) {
        return Some(id.clone());
    }
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.pointer("/data/id")? {
        Value::String(id) => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
