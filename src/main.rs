//! donation-gateway server entry point.
//!
//! Loads configuration, connects to PostgreSQL, wires the Stripe adapter
//! and starts the Axum HTTP server.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use donation_gateway::api;
use donation_gateway::api::auth::TokenVerifier;
use donation_gateway::app_state::AppState;
use donation_gateway::config::{LogFormat, PlatformConfig};
use donation_gateway::gateway::{StripeGateway, WebhookVerifier};
use donation_gateway::persistence::PgDonationStore;
use donation_gateway::persistence::postgres::{create_pool, run_migrations};
use donation_gateway::service::DonationService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = PlatformConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting donation-gateway");

    // Persistence
    let pool = create_pool(&config.database)
        .await
        .context("connecting to database")?;
    if config.database.run_migrations {
        run_migrations(&pool).await.context("running migrations")?;
        tracing::info!("database migrations applied");
    }
    let store = Arc::new(PgDonationStore::new(pool));

    // Payment gateway
    let stripe = config.stripe;
    let gateway = Arc::new(
        StripeGateway::new(stripe.api_base, stripe.secret_key, stripe.timeout)
            .context("building gateway client")?,
    );
    let verifier = WebhookVerifier::new(stripe.webhook_secret, stripe.webhook_tolerance);

    // Build service layer
    let donation_service = Arc::new(DonationService::new(
        store,
        gateway,
        verifier,
        config.funding_policy,
    ));
    tracing::info!(
        allow_pending = config.funding_policy.allow_pending,
        "donation service ready"
    );

    // Build application state
    let app_state = AppState {
        donation_service,
        tokens: Arc::new(TokenVerifier::new(config.jwt_secret)),
    };

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .layer(TimeoutLayer::new(config.request_timeout))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
