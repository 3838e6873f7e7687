//! `clubhubd`, the campus club server.
//!
//! Usage:
//!   clubhubd -c <config.toml> [--listen <addr>]

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use clubhub_core::Module;
use tracing::info;

use config::ServerConfig;

/// Campus club server.
#[derive(Parser, Debug)]
#[command(name = "clubhubd", about = "Campus club server")]
struct Cli {
    /// Path to the TOML config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: PathBuf,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {}", cli.config.display());
    let server_config = ServerConfig::load(&cli.config)?;
    server_config.validate()?;

    let data_dir = PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = clubhub_core::ServiceConfig {
        data_dir: Some(data_dir),
        db_path: server_config.storage.db_path.as_ref().map(PathBuf::from),
        listen: cli.listen.clone(),
    };

    let db_path = core_config.resolve_db_path();
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let kv: Arc<dyn clubhub_kv::KVStore> = Arc::new(
        clubhub_kv::RedbStore::open(&db_path)
            .map_err(|e| anyhow::anyhow!("failed to open KV store: {}", e))?,
    );
    info!("KV store opened at {}", db_path.display());

    let club_module = club::ClubModule::new(
        Arc::clone(&kv),
        club::service::ClubConfig {
            default_page_size: server_config.pagination.default_page_size,
            max_page_size: server_config.pagination.max_page_size,
        },
    );
    info!("Club module initialized");

    let reconcile = club::worker::start(
        Arc::clone(club_module.service()),
        club::worker::WorkerConfig {
            reconcile_interval: server_config.reconcile.interval_secs,
        },
    );

    let app = build_router(vec![(club_module.name(), club_module.routes())]);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("clubhubd listening on {}", core_config.listen);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    reconcile.cancel();
    info!("clubhubd stopped");
    Ok(())
}

/// System endpoints plus every module's routes under `/{name}`.
fn build_router(module_routes: Vec<(&str, Router)>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health))
        .route("/version", get(version));
    for (name, router) in module_routes {
        app = app.nest(&format!("/{}", name), router);
    }
    app
}

async fn health() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "status": "ok",
    }))
}

async fn version() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": "clubhubd",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
