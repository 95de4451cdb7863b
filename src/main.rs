use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use storefront_checkout::alerts::LogAlertSink;
use storefront_checkout::api;
use storefront_checkout::app_system::{setup_tracing, CheckoutSystem, SystemSettings};
use storefront_checkout::config::AppConfig;
use storefront_checkout::domain::ProductCreate;
use storefront_checkout::gateway::MercadoPagoGateway;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Setup tracing once for the entire application
    setup_tracing();

    let config = AppConfig::from_env().context("loading configuration")?;
    info!(bind_addr = %config.bind_addr, currency = %config.pricing.currency, "Starting checkout server");

    let gateway = MercadoPagoGateway::new(&config.gateway, config.pricing.currency.clone())
        .context("building payment gateway client")?;
    let system = CheckoutSystem::new(Arc::new(gateway), Arc::new(LogAlertSink), SystemSettings::from(&config));
    warn!("Orders and stock are held in memory and are lost on restart");

    if let Some(path) = &config.catalog_seed {
        let products = read_seed(path)?;
        system
            .seed_catalog(products)
            .await
            .with_context(|| format!("seeding catalog from {}", path.display()))?;
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("binding {}", config.bind_addr))?;
    info!("HTTP server listening for requests");

    axum::serve(listener, api::router(system.state()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    info!("HTTP server stopped");
    system.shutdown().await.map_err(anyhow::Error::msg)?;
    Ok(())
}

fn read_seed(path: &Path) -> anyhow::Result<Vec<ProductCreate>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C signal");
}
