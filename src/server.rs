//! Server setup and initialization
//!
//! Wires together storage, the checked-process registry, the template
//! repository and the execution bridge, and exposes them through the
//! HTTP router. Provides the application factory used by main and by
//! integration tests.

use crate::{
    api::processes::{create_process_routes, AppState},
    bridge::{ExecutionBridge, ExecutionEngine, HttpEngineClient},
    config::Config,
    process::{registry::ProcessRegistry, storage::ProcessStorage},
    templates::{SqliteTemplateStore, TemplateRepository},
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::{str::FromStr, sync::Arc, time::Duration};
use tokio::net::TcpListener;

/// Create the main Axum application with all routes.
///
/// Initializes the database schema, loads and validates every stored
/// process into the registry, and connects the bridge to the configured
/// execution engine.
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!(
        "📁 Ensuring data directory exists: {}",
        config.database.data_dir
    );
    std::fs::create_dir_all(&config.database.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    let db_path = format!("{}/credflow.db", config.database.data_dir);
    let options = SqliteConnectOptions::from_str(&format!("sqlite://{}", db_path))?
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(options).await?;

    tracing::info!("📋 Initializing process storage");
    let storage = ProcessStorage::new(pool.clone());
    storage.init_schema().await?;

    tracing::info!("🗂️ Initializing template store");
    let template_store = SqliteTemplateStore::new(pool);
    template_store.init_schema().await?;
    let templates: Arc<dyn TemplateRepository> = Arc::new(template_store);

    tracing::info!("📥 Loading processes from storage");
    let registry = Arc::new(ProcessRegistry::new(storage.clone()));
    registry.init_from_storage().await?;

    tracing::info!(
        "🔌 Connecting execution bridge to {}",
        config.engine.base_url
    );
    let engine: Arc<dyn ExecutionEngine> = Arc::new(HttpEngineClient::new(
        config.engine.base_url.clone(),
        Duration::from_secs(config.engine.timeout_secs),
    )?);
    let bridge = Arc::new(ExecutionBridge::new(Arc::clone(&registry), engine));

    let app_state = AppState {
        storage,
        registry,
        bridge,
        templates,
    };

    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_process_routes().with_state(app_state));

    tracing::info!("✅ Application initialized");

    Ok(app)
}

/// Start the HTTP server with the given configuration.
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting credflow server...");

    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}

/// Health check endpoint handler.
async fn health_check() -> &'static str {
    "ok"
}
