//! Odontia retention API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use std::sync::Arc;

use odontia_application::{
    PolicyRegistry, RetentionScheduler, RetentionService, RunLeaseCoordinator,
};
use odontia_core::AppError;
use odontia_infrastructure::{
    PostgresAuditRepository, RedisRunLeaseCoordinator, postgres_retention_sweepers,
};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, init_tracing};
use crate::state::AppState;

const LEASE_KEY_PREFIX: &str = "odontia:lease";

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let registry = PolicyRegistry::from_overrides(&config.retention.policy_overrides)?;
    for policy in registry.list_policies() {
        info!(
            category = %policy.category(),
            retention_period = %policy.retention_period(),
            enabled = policy.is_enabled(),
            "retention policy registered"
        );
    }

    let retention_service = RetentionService::new(
        registry,
        postgres_retention_sweepers(pool.clone()),
        Arc::new(PostgresAuditRepository::new(pool.clone())),
    )?
    .with_sweep_timeout(config.retention.sweep_timeout);

    let lease_coordinator = build_lease_coordinator(config.redis_url.as_deref())?;
    let scheduler = RetentionScheduler::start(
        retention_service.clone(),
        config.retention.scheduler_config()?,
        lease_coordinator,
    )?;

    let app = api_router::build_router(AppState {
        retention_service,
        admin_api_token: Arc::from(config.admin_api_token.as_str()),
    });

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind {address}: {error}")))?;

    info!(%address, "odontia retention api listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|error| AppError::Internal(format!("api server failed: {error}")))?;

    info!("api stopped accepting connections, stopping retention scheduler");
    scheduler.shutdown(config.retention.shutdown_grace).await;

    Ok(())
}

fn build_lease_coordinator(
    redis_url: Option<&str>,
) -> Result<Option<Arc<dyn RunLeaseCoordinator>>, AppError> {
    let Some(redis_url) = redis_url else {
        info!("REDIS_URL not set, scheduled runs are coordinated per process only");
        return Ok(None);
    };

    let client = redis::Client::open(redis_url)
        .map_err(|error| AppError::Validation(format!("invalid REDIS_URL: {error}")))?;

    Ok(Some(Arc::new(RedisRunLeaseCoordinator::new(
        client,
        LEASE_KEY_PREFIX,
    ))))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(error = %error, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                warn!(error = %error, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
