pub mod checkout;
pub mod order;
pub mod product;

pub use checkout::*;
pub use order::*;
pub use product::*;
