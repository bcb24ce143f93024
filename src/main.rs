//! registration-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use registration_gateway::api;
use registration_gateway::app_state::AppState;
use registration_gateway::config::GatewayConfig;
use registration_gateway::domain::EventBus;
use registration_gateway::ledger::{CapacityLedger, InMemoryLedger};
use registration_gateway::persistence::PostgresLedger;
use registration_gateway::service::{RegistrationService, RetryPolicy};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env().context("invalid LISTEN_ADDR")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(addr = %config.listen_addr, persistence = config.persistence_enabled, "starting registration-gateway");

    // Build the ledger
    let ledger: Arc<dyn CapacityLedger> = if config.persistence_enabled {
        let ledger = PostgresLedger::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        ledger
            .ensure_schema()
            .await
            .context("bootstrapping ledger schema")?;
        tracing::info!("using PostgreSQL ledger");
        Arc::new(ledger)
    } else {
        tracing::info!("using in-memory ledger");
        Arc::new(InMemoryLedger::new())
    };

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let retry = RetryPolicy::new(
        config.register_max_attempts,
        config.register_retry_backoff(),
    );
    let registration_service = Arc::new(RegistrationService::new(ledger, event_bus, retry));

    let app = api::build_app(
        AppState::new(registration_service),
        config.request_timeout(),
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
