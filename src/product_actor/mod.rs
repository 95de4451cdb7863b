//! Inventory ledger records: stock checks and conditional decrements.

mod actions;
pub mod entity;
pub mod error;

pub use actions::*;
pub use error::*;
