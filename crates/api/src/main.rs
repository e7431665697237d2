use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{info, warn};

use subtrack_api::app::{create_app, Stores};
use subtrack_api::config::Config;
use subtrack_api::jobs::{JobScheduler, PoolMetricsJob, SessionCleanupJob};
use subtrack_api::middleware::{init_metrics, logging::init_logging};
use subtrack_api::services::admin_bootstrap::{bootstrap_admin, BootstrapOutcome};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::load().context("Failed to load configuration")?;

    init_logging(&config.logging).context("Failed to initialize logging")?;
    info!("Starting subtrack v{}", env!("CARGO_PKG_VERSION"));

    init_metrics().context("Failed to install Prometheus recorder")?;

    let pool = persistence::db::create_pool(&(&config.database).into())
        .await
        .context("Failed to connect to database")?;

    info!("Running database migrations...");
    persistence::db::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");

    let stores = Stores::postgres(pool.clone(), config.session.ttl());

    match bootstrap_admin(stores.users.as_ref(), &config.admin).await {
        Ok(BootstrapOutcome::Skipped) => {}
        Ok(outcome) => info!(outcome = ?outcome, "Admin bootstrap finished"),
        Err(e) => warn!(error = %e, "Admin bootstrap failed"),
    }

    let mut scheduler = JobScheduler::new();
    scheduler.register(SessionCleanupJob::new(
        stores.sessions.clone(),
        config.session.cleanup_interval_minutes,
    ));
    scheduler.register(PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    let addr = config.socket_addr().context("Invalid server address")?;
    let app = create_app(config, stores, Some(pool));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
