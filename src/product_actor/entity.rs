use chrono::Utc;
use rust_decimal::Decimal;

use crate::actor_framework::Entity;
use crate::domain::{Product, ProductCreate, ProductPatch};
use super::actions::{ProductAction, ProductActionResult};
use super::error::ProductError;

impl Entity for Product {
    type Id = String;
    type CreateParams = ProductCreate;
    type Patch = ProductPatch;
    type Action = ProductAction;
    type ActionResult = ProductActionResult;
    type Error = ProductError;

    fn id(&self) -> &String { &self.id }

    /// Creates a new Product from creation parameters.
    ///
    /// # Arguments
    /// * `id` - Catalog key chosen by the caller
    /// * `params` - Name, unit price, opening stock and image
    fn from_create_params(id: String, params: ProductCreate) -> Result<Self, ProductError> {
        validate_price(params.unit_price)?;
        Ok(Self {
            id,
            name: params.name,
            unit_price: params.unit_price,
            stock: params.stock,
            image_ref: params.image_ref,
            updated_at: Some(Utc::now()),
        })
    }

    /// Applies an administrator's catalog edit.
    ///
    /// # Fields Updated
    /// - `name`, `unit_price`, `image_ref`: display and pricing data
    /// - `stock`: absolute stock count (restock or correction)
    fn on_update(&mut self, patch: ProductPatch) -> Result<(), ProductError> {
        if let Some(unit_price) = patch.unit_price {
            validate_price(unit_price)?;
            self.unit_price = unit_price;
        }
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
        if patch.image_ref.is_some() {
            self.image_ref = patch.image_ref;
        }
        self.updated_at = Some(Utc::now());
        Ok(())
    }

    /// Handles stock actions. The check and the write happen in the same call, so
    /// no other request can act on a stale stock value in between.
    fn handle_action(&mut self, action: ProductAction) -> Result<ProductActionResult, ProductError> {
        match action {
            ProductAction::CheckStock => Ok(ProductActionResult::CheckStock(self.stock)),
            ProductAction::TryDecrement(0) => Err(ProductError::InvalidQuantity(0)),
            ProductAction::TryDecrement(qty) => {
                if self.stock < qty {
                    return Err(ProductError::InsufficientStock {
                        product_id: self.id.clone(),
                        requested: qty,
                        available: self.stock,
                    });
                }
                self.stock -= qty;
                self.updated_at = Some(Utc::now());
                Ok(ProductActionResult::TryDecrement(self.stock))
            }
        }
    }
}

fn validate_price(unit_price: Decimal) -> Result<(), ProductError> {
    if unit_price.is_sign_negative() {
        return Err(ProductError::ValidationError(format!("negative unit price {unit_price}")));
    }
    Ok(())
}
