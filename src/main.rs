//! ReCore - accelerator telemetry classification service
//!
//! # Usage
//!
//! ```bash
//! # Serve on the configured address (default 0.0.0.0:5000)
//! cargo run --release
//!
//! # Explicit config and JSON logs
//! ./recore --config /etc/recore/recore.toml --log-json
//! ```
//!
//! # Environment Variables
//!
//! - `RECORE_CONFIG`: Path to a TOML config file
//! - `RECORE_STORE_URI` / `MONGO_URI`: Record store location
//! - `RECORE_MODEL_DIR`: Directory with the classification artifacts
//! - `RECORE_SERVER_ADDR`: HTTP bind address
//! - `RUST_LOG`: Logging level (default: info)
//! - `RESET_DB`: Set to "true" to wipe stored batches on startup

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use recore::storage::open_store;
use recore::{create_app, AppContext, ServiceConfig};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "recore")]
#[command(about = "ReCore accelerator telemetry classification service")]
#[command(version)]
struct CliArgs {
    /// Override the server address (default: "0.0.0.0:5000")
    #[arg(short, long)]
    addr: Option<String>,

    /// Path to a TOML config file (takes precedence over RECORE_CONFIG)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    /// Remove every stored batch on startup.
    /// Can also be set via RESET_DB=true environment variable.
    #[arg(long)]
    reset_db: bool,
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

/// Check if a reset is requested via CLI flag or environment variable.
fn should_reset_db(cli_flag: bool) -> bool {
    if cli_flag {
        return true;
    }
    std::env::var("RESET_DB")
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

fn reset_store(config: &ServiceConfig) -> Result<()> {
    warn!(uri = %config.store.uri, "RESET_DB requested, removing all stored batches");
    let store = open_store(&config.store).context("Failed to open record store for reset")?;
    store.clear().context("Failed to clear record store")?;
    Ok(())
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    match dotenvy::dotenv() {
        Ok(path) => info!(path = %path.display(), "Loaded environment from .env"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!(error = %e, "Failed to read .env"),
    }

    let mut config = ServiceConfig::load(args.config.as_deref()).context("Invalid configuration")?;
    if let Some(addr) = args.addr {
        config.server.addr = addr;
    }

    if should_reset_db(args.reset_db) {
        reset_store(&config)?;
    }

    info!("  ReCore - Accelerator Telemetry Classification");
    info!(
        model_dir = %config.model.dir.display(),
        store = %config.store.uri,
        unmapped_cluster = ?config.model.unmapped_cluster,
        "Configuration loaded"
    );

    let server_addr = config.server.addr.clone();
    let ctx = AppContext::from_config(config);
    if !ctx.predictions_enabled() {
        warn!("Serving read-only: POST /predict will answer 503 until artifacts are installed");
    }
    let app = create_app(ctx);

    // Graceful shutdown via Ctrl+C
    let cancel_token = CancellationToken::new();
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown...");
        shutdown_token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind {server_addr}"))?;
    info!(addr = %server_addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel_token.cancelled().await;
            info!("[HttpServer] Received shutdown signal");
        })
        .await
        .context("HTTP server error")?;

    info!("[HttpServer] Graceful shutdown complete");
    Ok(())
}
