//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, ephemeral store setup, worker spawning, and
//! Axum server lifecycle.

use crate::application::services::ClickRecorder;
use crate::config::Config;
use crate::domain::click_worker::run_click_worker;
use crate::domain::repositories::{
    ClickRepository, DashboardRepository, LinkRepository, TokenRepository,
};
use crate::infrastructure::cache::{EphemeralStore, MemoryStore, RedisStore};
use crate::infrastructure::persistence::{
    PgClickRepository, PgDashboardRepository, PgLinkRepository, PgTokenRepository,
};
use crate::routes::app_router;
use crate::state::{AppState, StateSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// How often the in-process store drops expired keys.
const MEMORY_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// How long shutdown waits for queued clicks to be recorded.
const CLICK_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

async fn connect_pool(config: &Config) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    tracing::info!(
        max_connections = config.db_max_connections,
        "Connected to database"
    );
    Ok(pool)
}

/// Connects to Redis, or falls back to the in-process store.
///
/// The fallback keeps redirects and rate limiting working on a single
/// instance; counters and cached destinations are not shared across replicas.
async fn connect_store(config: &Config) -> Arc<dyn EphemeralStore> {
    if let Some(redis_url) = &config.redis_url {
        match RedisStore::connect(redis_url).await {
            Ok(redis) => {
                tracing::info!("Ephemeral store: Redis");
                return Arc::new(redis);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to connect to Redis, using in-process store");
            }
        }
    } else {
        tracing::info!("Redis not configured, using in-process store");
    }

    let store = MemoryStore::new();
    spawn_memory_sweeper(store.clone());
    Arc::new(store)
}

fn spawn_memory_sweeper(store: MemoryStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(MEMORY_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = store.purge_expired();
            if purged > 0 {
                tracing::debug!(purged, remaining = store.len(), "Swept expired keys");
            }
        }
    });
}

/// Resolves when Ctrl-C or (on Unix) SIGTERM is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received");
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Redis store (or in-process fallback)
/// - Background click worker
/// - Axum HTTP server with graceful shutdown
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = connect_pool(&config).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations applied");

    let store = connect_store(&config).await;

    let pool = Arc::new(pool);
    let link_repository: Arc<dyn LinkRepository> = Arc::new(PgLinkRepository::new(pool.clone()));
    let click_repository: Arc<dyn ClickRepository> =
        Arc::new(PgClickRepository::new(pool.clone()));
    let dashboard_repository: Arc<dyn DashboardRepository> =
        Arc::new(PgDashboardRepository::new(pool.clone()));
    let token_repository: Arc<dyn TokenRepository> =
        Arc::new(PgTokenRepository::new(pool.clone()));

    let (click_tx, click_rx) = mpsc::channel(config.click_queue_capacity);

    let recorder = Arc::new(ClickRecorder::new(
        link_repository.clone(),
        click_repository,
        store.clone(),
    ));
    let worker = tokio::spawn(run_click_worker(
        click_rx,
        recorder,
        config.click_worker_concurrency,
    ));

    let state = AppState::new(
        link_repository,
        dashboard_repository,
        token_repository,
        store,
        click_tx,
        StateSettings::from_config(&config),
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    // The router (and every click sender it held) is gone; let the worker drain.
    match tokio::time::timeout(CLICK_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => tracing::info!("Click queue drained"),
        Ok(Err(e)) => tracing::error!(error = %e, "Click worker terminated abnormally"),
        Err(_) => tracing::warn!("Timed out draining click queue"),
    }

    pool.close().await;
    Ok(())
}
