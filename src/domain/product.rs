use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog record held by the inventory ledger.
///
/// `stock` only moves through the ledger's conditional operations.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub stock: u32,
    pub image_ref: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for adding a product to the catalog. The id is chosen by the caller.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCreate {
    pub id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub stock: u32,
    #[serde(default)]
    pub image_ref: Option<String>,
}

/// Payload for catalog edits made by an administrator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub unit_price: Option<Decimal>,
    pub stock: Option<u32>,
    pub image_ref: Option<String>,
}

/// One line of a stock mutation or stock check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockLine {
    pub product_id: String,
    pub qty: u32,
}

impl StockLine {
    pub fn new(product_id: impl Into<String>, qty: u32) -> Self {
        Self {
            product_id: product_id.into(),
            qty,
        }
    }
}
