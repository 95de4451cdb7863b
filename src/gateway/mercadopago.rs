use async_trait::async_trait;
use reqwest::StatusCode;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{BackUrls, GatewayError, IntentRequest, Payer, PaymentGateway, PaymentInfo, PaymentIntent, PaymentStatus};
use crate::config::GatewayConfig;

/// Mercado Pago Checkout Pro client.
pub struct MercadoPagoGateway {
    http: reqwest::Client,
    api_base: String,
    access_token: String,
    currency: String,
    notification_url: Option<String>,
}

impl MercadoPagoGateway {
    pub fn new(config: &GatewayConfig, currency: impl Into<String>) -> Result<Self, GatewayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::Unavailable(e.to_string()))?;
        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            currency: currency.into(),
            notification_url: config.notification_url.clone(),
        })
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response, lookup: Option<&str>) -> Result<T, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, body, lookup));
        }
        response.json::<T>().await.map_err(|e| GatewayError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl PaymentGateway for MercadoPagoGateway {
    #[instrument(skip(self, request), fields(order_id = %request.external_reference))]
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        debug!("Creating payment preference");
        let body = PreferenceBody::new(&request, &self.currency, self.notification_url.as_deref());
        let response = self
            .http
            .post(format!("{}/checkout/preferences", self.api_base))
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;

        let preference: PreferenceResponse = Self::decode(response, None).await?;
        Ok(PaymentIntent {
            intent_id: preference.id,
            redirect_url: preference.init_point,
        })
    }

    #[instrument(skip(self))]
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentInfo, GatewayError> {
        if payment_id.is_empty() || !payment_id.bytes().all(|b| b.is_ascii_digit()) {
            warn!("Payment id is not numeric");
            return Err(GatewayError::UnknownPayment(payment_id.to_string()));
        }
        debug!("Fetching payment");
        let response = self
            .http
            .get(format!("{}/v1/payments/{payment_id}", self.api_base))
            .bearer_auth(&self.access_token)
            .send()
            .await
            .map_err(transport)?;

        let payment: PaymentResponse = Self::decode(response, Some(payment_id)).await?;
        Ok(payment.into())
    }
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Unavailable(e.to_string())
}

/// Maps a non-success response. `lookup` is the payment id for lookups, where a
/// 404 means the id is unknown rather than the endpoint being wrong.
fn classify_failure(status: StatusCode, body: String, lookup: Option<&str>) -> GatewayError {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return GatewayError::Unavailable(format!("{status}: {body}"));
    }
    match lookup {
        Some(payment_id) if status == StatusCode::NOT_FOUND => GatewayError::UnknownPayment(payment_id.to_string()),
        _ => GatewayError::Rejected {
            status: status.as_u16(),
            message: body,
        },
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct PreferenceBody<'a> {
    items: Vec<PreferenceItem<'a>>,
    external_reference: &'a str,
    payer: &'a Payer,
    back_urls: &'a BackUrls,
    #[serde(skip_serializing_if = "Option::is_none")]
    auto_return: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    notification_url: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PreferenceItem<'a> {
    title: &'a str,
    quantity: u32,
    unit_price: Decimal,
    currency_id: &'a str,
}

impl<'a> PreferenceBody<'a> {
    fn new(request: &'a IntentRequest, currency: &'a str, notification_url: Option<&'a str>) -> Self {
        let items = request
            .items
            .iter()
            .map(|item| PreferenceItem {
                title: &item.title,
                quantity: item.quantity,
                unit_price: item.unit_price,
                currency_id: currency,
            })
            .collect();
        Self {
            items,
            external_reference: &request.external_reference,
            payer: &request.payer,
            back_urls: &request.back_urls,
            // Mercado Pago refuses auto_return without a success URL.
            auto_return: (!request.back_urls.success.is_empty()).then_some("approved"),
            notification_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PreferenceResponse {
    id: String,
    init_point: String,
}

#[derive(Debug, Deserialize)]
struct PaymentResponse {
    id: u64,
    status: String,
    #[serde(default)]
    external_reference: Option<String>,
    #[serde(default)]
    order: Option<MerchantOrderRef>,
}

#[derive(Debug, Deserialize)]
struct MerchantOrderRef {
    #[serde(default)]
    id: Option<u64>,
}

impl From<PaymentResponse> for PaymentInfo {
    fn from(payment: PaymentResponse) -> Self {
        Self {
            payment_id: payment.id.to_string(),
            status: PaymentStatus::parse(&payment.status),
            external_reference: payment.external_reference.filter(|reference| !reference.is_empty()),
            merchant_order_id: payment.order.and_then(|order| order.id).map(|id| id.to_string()),
        }
    }
}
