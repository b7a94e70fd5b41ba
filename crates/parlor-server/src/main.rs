//! Parlor - account and session backend

use anyhow::{Context, Result};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::{Config, Overrides};
use parlor_api::{ApiConfig, AppState, create_router};
use parlor_auth::JwtManager;
use parlor_db::Database;

/// Parlor - account and session backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; variables may come from the real environment.
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = Config::resolve(&args.config, args.overrides)?;

    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Parlor v{}", env!("CARGO_PKG_VERSION"));
    info!("Environment: {}", config.server.environment);
    if config.uses_default_secret() {
        warn!("Using the default JWT secret; set JWT_SECRET before deploying");
    }

    if let Some(dir) = config.database.sqlite_dir() {
        tokio::fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create database directory {}", dir.display()))?;
    }

    let db = Database::new(&config.database.url)
        .await
        .context("Failed to open database")?;
    info!("{} registered user(s)", db.count_users().await?);

    let jwt = Arc::new(JwtManager::new(&config.auth.jwt_secret, config.token_expiry()));

    let api_config = ApiConfig::new(config.is_production(), &config.server.client_origin)
        .with_context(|| format!("Invalid client origin: {}", config.server.client_origin))?;

    let metrics_handle = match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => Some(Arc::new(handle)),
        Err(e) => {
            warn!("Metrics disabled: {}", e);
            None
        }
    };

    let state = AppState::new(db, jwt, api_config);

    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.bind_address, config.server.port)
        .parse()
        .context("Invalid bind address")?;

    info!("Listening on {}", addr);
    info!("Allowed origin: {}", config.server.client_origin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
