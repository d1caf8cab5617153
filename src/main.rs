//! Roomstage server binary.
//!
//! Wires the Postgres ledger, the HTTP staging provider, and local object
//! storage into the HTTP surface and serves it.

use std::sync::Arc;

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roomstage::adapters::ai::{HttpStagingProvider, StagingProviderConfig};
use roomstage::adapters::http::{
    billing_routes, staging_routes, BillingHandlers, StagingHandlers,
};
use roomstage::adapters::postgres::{
    PostgresCreditLedger, PostgresPaymentEventRepository, PostgresStagingJobRepository,
};
use roomstage::adapters::storage::LocalObjectStore;
use roomstage::application::handlers::billing::{
    GetCreditBalanceHandler, ProcessPaymentWebhookHandler,
};
use roomstage::application::handlers::staging::{GetStagingJobHandler, SubmitStagingJobHandler};
use roomstage::config::AppConfig;
use roomstage::domain::billing::PaymentWebhookVerifier;

async fn health() -> &'static str {
    "OK"
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.log_level))
        .init();

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!().run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    // Ports backed by real infrastructure.
    let ledger = Arc::new(PostgresCreditLedger::new(pool.clone()));
    let jobs = Arc::new(PostgresStagingJobRepository::new(pool.clone()));
    let payment_events = Arc::new(PostgresPaymentEventRepository::new(pool.clone()));
    let store = Arc::new(LocalObjectStore::new(config.storage.root.clone()));

    let provider_config =
        StagingProviderConfig::new(config.ai.api_key.clone(), config.ai.base_url.clone())
            .with_timeout(config.ai.timeout());
    let provider = Arc::new(HttpStagingProvider::new(provider_config)?);

    // Application handlers.
    let submit_handler = Arc::new(SubmitStagingJobHandler::new(
        ledger.clone(),
        jobs.clone(),
        provider,
        store,
        config.ai.timeout(),
    ));
    let get_handler = Arc::new(GetStagingJobHandler::new(jobs));
    let balance_handler = Arc::new(GetCreditBalanceHandler::new(ledger.clone()));

    let verifier = PaymentWebhookVerifier::new(config.payment.webhook_secret.clone());
    let webhook_handler = Arc::new(ProcessPaymentWebhookHandler::new(
        verifier,
        ledger,
        payment_events,
        config.payment.signup_bonus,
    ));

    let app = Router::new()
        .route("/health", get(health))
        .nest(
            "/api/staging-jobs",
            staging_routes(StagingHandlers::new(submit_handler, get_handler)),
        )
        .nest(
            "/api",
            billing_routes(BillingHandlers::new(webhook_handler, balance_handler)),
        )
        .layer(TraceLayer::new_for_http());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening for incoming connections");
    axum::serve(listener, app).await?;

    Ok(())
}
