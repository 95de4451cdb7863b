/// Custom actions for Product entities.
///
/// These are the only operations that move stock.
#[derive(Debug, Clone, PartialEq)]
pub enum ProductAction {
    /// Checks the current stock level without modifying it.
    CheckStock,
    /// Removes `u32` units if at least that many are in stock.
    ///
    /// # Errors
    /// Fails with `InsufficientStock` when the request exceeds current stock, and
    /// with `InvalidQuantity` for zero.
    TryDecrement(u32),
}

/// Results from ProductActions - variants match 1:1 with ProductAction
#[derive(Debug, Clone, PartialEq)]
pub enum ProductActionResult {
    /// Result from CheckStock action - returns the current stock level
    CheckStock(u32),
    /// Result from TryDecrement action - returns the remaining stock
    TryDecrement(u32),
}
