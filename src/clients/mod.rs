//! Typed handles over the store actors.

#[macro_use]
mod macros;
pub mod inventory_ledger;
pub mod order_store;

pub use inventory_ledger::*;
pub use order_store::*;
