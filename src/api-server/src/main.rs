//! Vehicle Claims Provider API Server
//!
//! # Usage
//!
//! ```bash
//! # Start with an in-memory store on 0.0.0.0:8080
//! cargo run --bin cvp-claims-server
//!
//! # Use PostgreSQL and apply migrations on startup
//! cargo run --bin cvp-claims-server -- --database-url postgresql://localhost/claims --run-migrations
//!
//! # Enable debug logging
//! RUST_LOG=debug cargo run --bin cvp-claims-server
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Logging level or filter directives
//! - `CVP_SERVER_HOST`: Server host (default: 0.0.0.0)
//! - `CVP_SERVER_PORT`: Server port (default: 8080)
//! - `CVP_SERVER_REQUEST_TIMEOUT`: Request timeout in seconds (default: 30)
//! - `CVP_SERVER_JSON_LOGS`: Emit JSON logs
//! - `DATABASE_URL`: PostgreSQL connection string (default: in-memory store)

use anyhow::{Context, Result};
use axum::Router;
use clap::Parser;
use cvp_api_server::{create_router, AppState};
use cvp_claims::{ClaimStore, ClaimsProvider, InMemoryClaimStore, ProviderConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::timeout::TimeoutLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Vehicle Claims Provider API Server
#[derive(Parser, Debug)]
#[command(
    name = "cvp-claims-server",
    version,
    about = "REST API server for the vehicle claims provider",
    long_about = None
)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "CVP_SERVER_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "8080", env = "CVP_SERVER_PORT")]
    port: u16,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", env = "CVP_SERVER_REQUEST_TIMEOUT")]
    request_timeout: u64,

    /// Enable JSON logging format
    #[arg(long, env = "CVP_SERVER_JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// PostgreSQL connection string; the in-memory store is used when absent
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Apply database migrations on startup
    #[arg(long)]
    run_migrations: bool,

    /// Disable metrics collection
    #[arg(long)]
    disable_metrics: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args)?;

    info!("Starting Vehicle Claims Provider API Server");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let store = open_store(&args).await?;

    let config = ProviderConfig {
        enable_metrics: !args.disable_metrics,
    };
    let state = Arc::new(AppState::new(ClaimsProvider::new(config, store)));
    info!("Application state initialized");

    if let Err(e) = serve(&args, state).await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Router with the request timeout applied
fn app(state: Arc<AppState>, request_timeout: u64) -> Router {
    create_router(state).layer(TimeoutLayer::new(Duration::from_secs(request_timeout)))
}

/// Bind the listener and serve until a shutdown signal arrives
async fn serve(args: &Args, state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", args.host, args.port);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    let local_addr = listener.local_addr()?;
    info!("Claims API listening on http://{}", local_addr);
    info!("OpenAPI document: http://{}/api-docs/openapi.json", local_addr);
    info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app(state, args.request_timeout))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, draining in-flight lookups"),
        _ = terminate => info!("Received SIGTERM, draining in-flight lookups"),
    }
}

/// Open the claim store selected by the arguments
async fn open_store(args: &Args) -> Result<Arc<dyn ClaimStore>> {
    match &args.database_url {
        #[cfg(feature = "postgres")]
        Some(url) => {
            info!("Connecting to PostgreSQL claim store");
            let store = cvp_claims::PostgresClaimStore::new(url).await?;
            if args.run_migrations {
                store.run_migrations().await?;
                info!("Database migrations applied");
            }
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        Some(_) => anyhow::bail!("--database-url requires the `postgres` feature"),
        None => {
            info!("Using in-memory claim store");
            Ok(Arc::new(InMemoryClaimStore::new()))
        }
    }
}

/// Initialize tracing/logging subsystem
fn init_tracing(args: &Args) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log filter '{}', using 'info'", args.log_level);
        tracing_subscriber::EnvFilter::new("info")
    });

    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init()?;
    }

    Ok(())
}
