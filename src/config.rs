//! Process configuration, read from environment variables.
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | BIND_ADDR | 0.0.0.0:8080 | HTTP listen address |
//! | MP_ACCESS_TOKEN | (required) | Mercado Pago access token |
//! | MP_API_BASE | https://api.mercadopago.com | Gateway API base URL |
//! | MP_SUCCESS_URL / MP_FAILURE_URL / MP_PENDING_URL | empty | Buyer return URLs |
//! | MP_NOTIFICATION_URL | unset | Webhook URL sent with each intent |
//! | GATEWAY_TIMEOUT_SECS | 10 | Gateway request timeout |
//! | SHIPPING_SURCHARGE | 1500 | Flat surcharge for home delivery |
//! | CURRENCY | ARS | Currency of every price |
//! | STORE_MAILBOX_CAPACITY | 256 | Pending requests per store actor |
//! | CATALOG_SEED | unset | JSON file loaded into the ledger at startup |

use rust_decimal::Decimal;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::gateway::BackUrls;

const DEFAULT_API_BASE: &str = "https://api.mercadopago.com";

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    Missing(&'static str),
    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub access_token: String,
    pub api_base: String,
    pub back_urls: BackUrls,
    pub notification_url: Option<String>,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    pub shipping_surcharge: Decimal,
    pub currency: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            shipping_surcharge: Decimal::from(1500),
            currency: "ARS".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub gateway: GatewayConfig,
    pub pricing: PricingConfig,
    pub mailbox_capacity: usize,
    pub catalog_seed: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let pricing_defaults = PricingConfig::default();

        let access_token = var("MP_ACCESS_TOKEN").ok_or(ConfigError::Missing("MP_ACCESS_TOKEN"))?;
        let gateway = GatewayConfig {
            access_token,
            api_base: var("MP_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            back_urls: BackUrls {
                success: var("MP_SUCCESS_URL").unwrap_or_default(),
                failure: var("MP_FAILURE_URL").unwrap_or_default(),
                pending: var("MP_PENDING_URL").unwrap_or_default(),
            },
            notification_url: var("MP_NOTIFICATION_URL"),
            timeout: Duration::from_secs(parse_or("GATEWAY_TIMEOUT_SECS", var("GATEWAY_TIMEOUT_SECS"), 10)?),
        };

        let mailbox_capacity = parse_or("STORE_MAILBOX_CAPACITY", var("STORE_MAILBOX_CAPACITY"), 256)?;
        if mailbox_capacity == 0 {
            return Err(ConfigError::Invalid {
                name: "STORE_MAILBOX_CAPACITY",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_addr: parse_or("BIND_ADDR", var("BIND_ADDR"), SocketAddr::from(([0, 0, 0, 0], 8080)))?,
            gateway,
            pricing: PricingConfig {
                shipping_surcharge: parse_or(
                    "SHIPPING_SURCHARGE",
                    var("SHIPPING_SURCHARGE"),
                    pricing_defaults.shipping_surcharge,
                )?,
                currency: var("CURRENCY").unwrap_or(pricing_defaults.currency),
            },
            mailbox_capacity,
            catalog_seed: var("CATALOG_SEED").map(PathBuf::from),
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_token_only() {
        let config = AppConfig::from_lookup(lookup(&[("MP_ACCESS_TOKEN", "TEST-123")])).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.gateway.api_base, DEFAULT_API_BASE);
        assert_eq!(config.gateway.timeout, Duration::from_secs(10));
        assert_eq!(config.pricing, PricingConfig::default());
        assert_eq!(config.mailbox_capacity, 256);
        assert!(config.gateway.notification_url.is_none());
        assert!(config.catalog_seed.is_none());
    }

    #[test]
    fn test_missing_token() {
        let err = AppConfig::from_lookup(lookup(&[("MP_ACCESS_TOKEN", "  ")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("MP_ACCESS_TOKEN"));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("MP_ACCESS_TOKEN", "TEST-123"),
            ("BIND_ADDR", "127.0.0.1:9000"),
            ("SHIPPING_SURCHARGE", "2000.50"),
            ("MP_SUCCESS_URL", "https://shop.example/success"),
            ("CATALOG_SEED", "seed.json"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.pricing.shipping_surcharge, Decimal::new(200050, 2));
        assert_eq!(config.gateway.back_urls.success, "https://shop.example/success");
        assert_eq!(config.catalog_seed, Some(PathBuf::from("seed.json")));
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(lookup(&[("MP_ACCESS_TOKEN", "x"), ("STORE_MAILBOX_CAPACITY", "lots")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::Invalid {
                name: "STORE_MAILBOX_CAPACITY",
                value: "lots".into(),
            }
        );
    }
}
