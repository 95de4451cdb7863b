//! Checkout core for a small storefront: inventory ledger, order store, order
//! creation against a payment gateway, and exactly-once payment confirmation.

pub mod actor_framework;
pub mod alerts;
pub mod api;
pub mod app_system;
pub mod clients;
pub mod config;
pub mod domain;
pub mod error;
pub mod gateway;
pub mod order_actor;
pub mod product_actor;
pub mod services;

#[cfg(test)]
mod mock_framework;
