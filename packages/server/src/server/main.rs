// Main entry point for API server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use relief_core::domains::alerts::UsgsWatcher;
use relief_core::domains::auth::JwtVerifier;
use relief_core::domains::directory::Directory;
use relief_core::kernel::scheduled_tasks::start_scheduler;
use relief_core::kernel::{
    create_chat_model, AblyPublisher, NominatimGeocoder, ServerDeps, SupabaseAuthClient,
    UsgsFeedClient,
};
use relief_core::{server::build_app, Config};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,relief_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Relief Coordination API");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!("Configuration loaded");

    // Connect to database
    tracing::info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    tracing::info!("Migrations complete");

    // External services
    let realtime =
        Arc::new(AblyPublisher::from_key(&config.ably_api_key).context("Invalid ABLY_API_KEY")?);
    let auth_provider = Arc::new(SupabaseAuthClient::new(
        &config.supabase_url,
        config.supabase_anon_key.clone(),
    ));
    let chat_model = create_chat_model(&config);
    match &chat_model {
        Some(model) => tracing::info!(provider = model.provider(), "Chat assistant enabled"),
        None => tracing::warn!("No chat provider configured; /api/chat will return 503"),
    }

    let deps = ServerDeps::new(
        pool,
        realtime,
        auth_provider,
        Arc::new(JwtVerifier::new(&config.supabase_jwt_secret)),
        chat_model,
        Arc::new(NominatimGeocoder::new(&config.nominatim_url)),
        Arc::new(Directory::embedded()?),
        config.safety_check_minutes,
    );

    // Background tasks
    let watcher = Arc::new(UsgsWatcher::new(
        Arc::new(UsgsFeedClient::new(&config.usgs_feed_url)),
        config.usgs_min_magnitude,
    ));
    let mut scheduler = start_scheduler(
        deps.clone(),
        watcher,
        Duration::from_secs(config.usgs_poll_seconds.max(1)),
    )
    .await
    .context("Failed to start scheduler")?;

    // Build application
    let app = build_app(deps, &config.allowed_origins)?;

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Starting server on {}", addr);
    tracing::info!("Health check: http://localhost:{}/health", config.port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!(error = %e, "Scheduler did not shut down cleanly");
    }
    tracing::info!("Server stopped");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
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
