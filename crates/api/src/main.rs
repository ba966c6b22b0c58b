use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stylist_api::background::{long_processing, result_retention, style_sync};
use stylist_api::config::ServerConfig;
use stylist_api::engine::worker::{self, Worker, WorkerSettings};
use stylist_api::router::build_app_router;
use stylist_api::state::AppState;
use stylist_api::ws;
use stylist_db::queue::{MemoryTaskQueue, PgTaskQueue, TaskQueue};
use stylist_db::store::{
    MemoryStyleStore, MemoryTaskStore, PgStyleStore, PgTaskStore, StyleStore, TaskStore,
};
use stylist_transformer::{HttpTransformer, Transformer, TransformerApi};

type Backends = (Arc<dyn TaskStore>, Arc<dyn StyleStore>, Arc<dyn TaskQueue>);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stylist_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Stores and queue ---
    let (tasks, styles, queue) = build_backends(&config).await;

    // --- Transformer client ---
    let api = TransformerApi::new(config.transformer.url.clone(), config.transformer.timeout)
        .expect("Failed to build transformer HTTP client");
    let transformer: Arc<dyn Transformer> = Arc::new(HttpTransformer::new(api));
    tracing::info!(url = %config.transformer.url, "Transformer client created");

    // --- Task channels ---
    let registry = Arc::new(ws::TaskChannelRegistry::new());
    let heartbeat_handle = ws::start_heartbeat(Arc::clone(&registry));

    // --- Background loops ---
    let cancel = CancellationToken::new();
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    let worker = Arc::new(Worker::new(
        Arc::clone(&tasks),
        Arc::clone(&queue),
        Arc::clone(&transformer),
        Arc::clone(&registry),
        WorkerSettings {
            max_time_from_start: config.pipeline.max_time_from_start,
            api_key: config.transformer.api_key.clone(),
            poll_interval: config.pipeline.queue_poll_interval,
        },
    ));
    handles.extend(worker::spawn_pool(
        worker,
        config.pipeline.worker_concurrency,
        cancel.clone(),
    ));

    handles.push(tokio::spawn(long_processing::run(
        Arc::clone(&tasks),
        Arc::clone(&registry),
        config.pipeline.max_processing,
        config.pipeline.long_processing_sweep_interval,
        cancel.clone(),
    )));
    handles.push(tokio::spawn(result_retention::run(
        Arc::clone(&tasks),
        config.pipeline.result_ttl,
        config.pipeline.result_retention_sweep_interval,
        cancel.clone(),
    )));
    handles.push(tokio::spawn(style_sync::run(
        Arc::clone(&styles),
        Arc::clone(&transformer),
        config.transformer.style_sync_interval,
        cancel.clone(),
    )));
    tracing::info!(
        workers = config.pipeline.worker_concurrency,
        "Background services started (workers, sweeps, style sync)"
    );

    // --- App state ---
    let config = Arc::new(config);
    let state = AppState::new(
        Arc::clone(&config),
        tasks,
        styles,
        queue,
        Arc::clone(&registry),
    );
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    cancel.cancel();
    let drain = futures::future::join_all(handles);
    if tokio::time::timeout(Duration::from_secs(config.shutdown_timeout_secs), drain)
        .await
        .is_err()
    {
        tracing::warn!("Background services did not stop within the shutdown timeout");
    }
    tracing::info!("Background services stopped");

    let ws_count = registry.connection_count().await;
    tracing::info!(ws_count, "Closing remaining task channels");
    registry.shutdown_all().await;

    heartbeat_handle.abort();
    tracing::info!("Graceful shutdown complete");
}

/// Connect to PostgreSQL when `DATABASE_URL` is set, otherwise fall back to
/// the in-memory store and queue.
async fn build_backends(config: &ServerConfig) -> Backends {
    let visibility = config.pipeline.queue_visibility_timeout;

    let Some(database_url) = config.database_url.as_deref() else {
        tracing::warn!("DATABASE_URL not set, using in-memory store and queue");
        return (
            Arc::new(MemoryTaskStore::new()),
            Arc::new(MemoryStyleStore::default()),
            Arc::new(MemoryTaskQueue::new(visibility)),
        );
    };

    let pool = stylist_db::create_pool(database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    stylist_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    stylist_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    (
        Arc::new(PgTaskStore::new(pool.clone())),
        Arc::new(PgStyleStore::new(pool.clone())),
        Arc::new(PgTaskQueue::new(pool, visibility)),
    )
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
