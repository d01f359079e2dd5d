//! Product catalog HTTP server
//!
//! Main entry point for the REST API server.

use std::{io, net::SocketAddr, sync::Arc, time::Duration};

use application::ProductService;
use infrastructure::{
    AppConfig, AsyncDatabase, AsyncDatabaseConfig, LogFormat, LoggingConfig,
    SqliteDatabaseHealth, SqliteProductRepository, init_logging,
};
use presentation_http::{
    RateLimits, ViewerAuthLayer, openapi::OPENAPI_JSON_PATH, routes, spawn_cleanup_task,
    state::AppState,
};
use tokio::{net::TcpListener, signal, sync::watch};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let (config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    // Initialize tracing
    init_logging(&LoggingConfig {
        format: LogFormat::from_setting(&config.server.log_format),
        ..LoggingConfig::default()
    })?;

    info!("Catalog server v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(e) = load_error {
        warn!("Failed to load config, using defaults: {}", e);
    }

    info!(
        environment = %config.environment,
        host = %config.server.host,
        port = %config.server.port,
        database = %config.database.path,
        "Configuration loaded"
    );
    for warning in config.security_warnings() {
        warn!("{warning}");
    }

    // Initialize persistence
    let database = AsyncDatabase::new(&AsyncDatabaseConfig::from_config(&config.database)).await?;
    if config.database.run_migrations {
        database.migrate().await?;
        info!("Database migrations applied");
    }

    let repository = Arc::new(SqliteProductRepository::new(database.pool().clone()));
    let health = Arc::new(SqliteDatabaseHealth::new(database.pool().clone()));
    let product_service = ProductService::new(repository).with_database_health(health);

    // Rate limiting and authentication
    let rate_config = &config.security.rate_limit;
    let limits = RateLimits::from_config(rate_config);
    let cleanup = limits.is_enabled().then(|| {
        spawn_cleanup_task(
            limits.state(),
            Duration::from_secs(rate_config.cleanup_interval_secs.max(1)),
            Duration::from_secs(rate_config.cleanup_max_age_secs),
        )
    });
    let auth = ViewerAuthLayer::from_api_keys(&config.security.api_keys);

    let addr = config.server.bind_address();
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout_secs.unwrap_or(30));

    // Build router
    let state = AppState::new(product_service, config);
    let app = routes::create_app(state, &limits, &auth);

    // Start server
    let listener = TcpListener::bind(&addr).await?;

    info!("Server listening on http://{}", addr);
    info!("API docs: http://{}{}", addr, OPENAPI_JSON_PATH);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });
    drain_with_timeout(server.into_future(), shutdown_rx, shutdown_timeout).await?;

    if let Some(handle) = cleanup {
        handle.abort();
    }
    database.close().await;

    info!("Server shutdown complete");

    Ok(())
}

/// Run `server` to completion; once `shutdown` fires, open connections get
/// `grace` to finish before they are dropped
async fn drain_with_timeout<F>(
    server: F,
    mut shutdown: watch::Receiver<bool>,
    grace: Duration,
) -> io::Result<()>
where
    F: Future<Output = io::Result<()>>,
{
    let mut server = std::pin::pin!(server);

    tokio::select! {
        result = &mut server => return result,
        _ = shutdown.changed() => {}
    }

    info!("Waiting up to {:?} for connections to close...", grace);
    if let Ok(result) = tokio::time::timeout(grace, server).await {
        result
    } else {
        warn!("Shutdown timeout elapsed, dropping remaining connections");
        Ok(())
    }
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
