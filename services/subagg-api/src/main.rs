//! Subagg API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use subagg_api::build_router;
use subagg_api::config::{Config, LogFormat};
use subagg_api::state::AppState;
use subagg_db::{PgSubscriptionStore, SubscriptionStore};
use tokio::signal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_tracing(&config)?;

    tracing::info!("Starting Subagg API");
    tracing::info!(
        http_port = config.http_port,
        request_timeout_secs = config.request_timeout.as_secs(),
        db_max_connections = config.pool.max_connections,
        "Configuration loaded"
    );

    // Initialize metrics
    let metrics_handle = if config.metrics_enabled {
        Some(setup_metrics()?)
    } else {
        None
    };

    // Create database pool
    let pool = subagg_db::create_pool_with_options(&config.database_url, &config.pool).await?;
    tracing::info!("Database pool created");

    if config.run_migrations {
        subagg_db::run_migrations(&pool).await?;
        tracing::info!("Migrations applied");
    }

    // Create application state
    let store: Arc<dyn SubscriptionStore> = Arc::new(PgSubscriptionStore::new(pool.clone()));
    let http_addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let state = AppState::new(store, config);

    // Build HTTP router
    let app = build_router(state, metrics_handle);

    run_http_server(app, http_addr).await?;

    pool.close().await;
    tracing::info!("Shutdown complete");
    Ok(())
}

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .init(),
    }

    Ok(())
}

async fn run_http_server(app: axum::Router, addr: SocketAddr) -> anyhow::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn setup_metrics() -> anyhow::Result<PrometheusHandle> {
    // Most operations are a single indexed query or one short transaction
    let latency_buckets = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.2, 0.5, 1.0, 2.5];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("subagg_operation_duration_seconds".to_string()),
            latency_buckets,
        )?
        .install_recorder()?;

    // Register metrics with descriptions
    metrics::describe_counter!(
        "subagg_subscriptions_created_total",
        "Total subscriptions created"
    );
    metrics::describe_counter!(
        "subagg_subscriptions_updated_total",
        "Total subscription updates committed"
    );
    metrics::describe_counter!(
        "subagg_subscriptions_deleted_total",
        "Total subscriptions deleted"
    );
    metrics::describe_histogram!(
        "subagg_operation_duration_seconds",
        "Subscription operation latency in seconds by operation and result"
    );

    Ok(handle)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
