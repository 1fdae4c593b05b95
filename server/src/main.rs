//! # CardVault Server
//!
//! Entry point for the `cardvault-server` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the store, and serves the
//! tokenization API plus a Prometheus metrics endpoint.

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use cardvault::{Vault, VaultDb};

use cli::{CardVaultCli, Commands};
use logging::LogFormat;
use metrics::VaultMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = CardVaultCli::parse();

    match cli.command {
        Commands::Run(args) => run_server(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full server: API listener and metrics listener.
async fn run_server(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "cardvault_server=info,cardvault=info,tower_http=debug",
        LogFormat::Pretty,
    );

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        token_ttl_secs = args.token_ttl_secs,
        data_dir = %args.data_dir.display(),
        auth = args.api_key.is_some(),
        "starting cardvault-server"
    );

    // --- Persistent storage ---
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let db = VaultDb::open(&db_path)
        .with_context(|| format!("failed to open store at {}", db_path.display()))?;
    tracing::info!(
        path = %db_path.display(),
        cards = db.card_count(),
        tokens = db.token_count(),
        "store opened"
    );

    // --- Services ---
    let vault = Arc::new(Vault::with_ttl(
        db,
        Duration::from_secs(args.token_ttl_secs),
    ));
    let vault_metrics = Arc::new(VaultMetrics::new());

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        vault,
        metrics: Arc::clone(&vault_metrics),
        api_key: args.api_key,
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&vault_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    tracing::info!("cardvault-server stopped");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("cardvault-server {}", env!("CARGO_PKG_VERSION"));
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
