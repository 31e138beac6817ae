//! kotoba-api - Japanese vocabulary flashcard service
//!
//! Serves the flashcard REST API. Cards live in memory unless a database URL
//! is configured, in which case they are stored in SQLite.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use kotoba_common::config::{ConfigOverrides, ServiceConfig};
use kotoba_api::{build_router, open_store, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kotoba-api
#[derive(Parser, Debug)]
#[command(name = "kotoba-api")]
#[command(about = "Japanese vocabulary flashcard API")]
#[command(version)]
struct Args {
    /// Port to listen on [default: 5000]
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Address to bind [default: 0.0.0.0]
    #[arg(long, env = "KOTOBA_HOST")]
    host: Option<String>,

    /// SQLite connection string; omit to keep cards in memory
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// TOML config file
    #[arg(short, long, env = "KOTOBA_CONFIG")]
    config: Option<PathBuf>,

    /// Seed the four sample cards into a new store [default: true]
    #[arg(long, env = "KOTOBA_SEED")]
    seed: Option<bool>,

    /// Log level when RUST_LOG is unset (trace, debug, info, warn, error)
    #[arg(long, env = "KOTOBA_LOG_LEVEL")]
    log_level: Option<String>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        ConfigOverrides {
            config_path: args.config,
            port: args.port,
            host: args.host,
            database_url: args.database_url,
            seed_sample_data: args.seed,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServiceConfig::resolve(args.into()).context("Failed to load configuration")?;

    // Initialize tracing
    let level = &config.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("kotoba_api={level},kotoba_common={level},tower_http={level}").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Build identification first, before any storage delays
    info!(
        "Starting kotoba-api v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let store = open_store(&config)
        .await
        .context("Failed to open flashcard store")?;
    info!(
        backend = store.backend_name(),
        cards = store.count().await.unwrap_or_default(),
        seed = config.seed_sample_data,
        "Flashcard store ready"
    );

    let app = build_router(AppState::new(store));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("kotoba-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
