use anyhow::Context;
use rapido_api::{app, AppState};
use rapido_store::{app_config::Config, DbClient, PgCustomerRepository, PgOrderRepository};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "rapido_api=debug,rapido_order=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Rapido API on port {}", config.server.port);

    let db = DbClient::new(&config.database)
        .await
        .context("Failed to connect to Postgres")?;
    if config.database.run_migrations {
        db.migrate().await.context("Failed to run migrations")?;
    }

    // rows in business_rules win over the config file
    let rules = db
        .fetch_business_rules(config.business_rules.clone())
        .await
        .context("Failed to load business rules")?;
    tracing::info!(
        "Pricing rules: urgency {} / discount {} over {} / +{} over {} kg",
        rules.pricing.urgency_rate,
        rules.pricing.discount_rate,
        rules.pricing.discount_threshold,
        rules.pricing.overweight_fee,
        rules.pricing.overweight_limit_kg
    );

    let order_repo = Arc::new(PgOrderRepository::new(db.pool.clone()));
    let customer_repo = Arc::new(PgCustomerRepository::new(db.pool.clone()));
    let app_state = AppState::new(order_repo.clone(), order_repo, customer_repo, &rules);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app(app_state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
