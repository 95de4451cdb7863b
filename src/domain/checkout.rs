use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

const TRACKING_TOKEN_LEN: usize = 32;

/// Buyer contact details. Missing fields deserialize as empty and fail validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

impl Buyer {
    pub fn is_complete(&self) -> bool {
        [&self.name, &self.email, &self.phone]
            .iter()
            .all(|field| !field.trim().is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMethod {
    Shipping,
    Pickup,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub method: DeliveryMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Delivery {
    pub fn pickup() -> Self {
        Self {
            method: DeliveryMethod::Pickup,
            address: None,
        }
    }

    pub fn shipping(address: impl Into<String>) -> Self {
        Self {
            method: DeliveryMethod::Shipping,
            address: Some(address.into()),
        }
    }

    pub fn has_address(&self) -> bool {
        self.address.as_deref().is_some_and(|address| !address.trim().is_empty())
    }
}

/// One cart line as sent by the storefront. `name` and `image_url` are display
/// fields copied into the snapshot; price always comes from the catalog.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub qty: u32,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
            name: None,
            image_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub buyer: Buyer,
    pub delivery: Delivery,
    #[serde(default)]
    pub items: Vec<CartLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub payment_redirect_url: String,
    pub public_tracking_token: String,
}

/// Random, unguessable token for buyer self-service lookups.
pub fn new_tracking_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TRACKING_TOKEN_LEN)
        .map(char::from)
        .collect()
}
