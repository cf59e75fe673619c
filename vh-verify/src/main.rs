//! vh-verify - Health Claim Verification microservice
//!
//! **Module Identity:**
//! - Name: vh-verify
//! - Default port: 5780
//!
//! Cross-checks health claims against a literature-search service, a
//! retrieval-QA service, and a generative LLM, and serves the combined
//! verdicts over HTTP.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vh_common::config::{load_or_default, ConfigFileResolver, CONFIG_ENV_VAR};
use vh_verify::config::Credentials;
use vh_verify::roster::Roster;
use vh_verify::AppState;

const MODULE_NAME: &str = "vh-verify";

/// Command-line arguments for vh-verify
#[derive(Parser, Debug)]
#[command(name = "vh-verify")]
#[command(about = "Health claim verification microservice")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides TOML)
    #[arg(short, long, env = "VH_VERIFY_PORT")]
    port: Option<u16>,

    /// TOML bootstrap config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Influencer roster JSON file (overrides TOML)
    #[arg(short, long, env = "VH_ROSTER")]
    roster: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing is up so the log level can come from TOML
    let config_path = ConfigFileResolver::new(MODULE_NAME).resolve(args.config.as_deref());
    let mut config = load_or_default(config_path.as_deref())
        .with_context(|| format!("Failed to load config (see --config or {})", CONFIG_ENV_VAR))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    format!("vh_verify={0},vh_common={0},tower_http={0}", config.logging.level)
                        .into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting {} v{}", MODULE_NAME, env!("CARGO_PKG_VERSION"));
    // Repeated here: messages from the config load predate the subscriber
    match &config_path {
        Some(path) if path.exists() => info!("Config: {}", path.display()),
        Some(path) => warn!("Config file {} not found, using compiled defaults", path.display()),
        None => info!("Config: compiled defaults"),
    }

    if let Some(roster) = args.roster {
        config.roster.path = Some(roster);
    }
    let port = args.port.unwrap_or_else(|| config.port());

    let credentials = Credentials::resolve(&config);
    let missing = credentials.missing();
    if !missing.is_empty() {
        warn!(
            "Running without credentials for {:?}; their verdicts will be placeholders",
            missing
        );
    }

    let roster = Roster::load_optional(config.roster.path.as_deref())
        .context("Failed to load influencer roster")?;
    info!("Roster: {} influencers", roster.len());

    let state = AppState::from_config(&config, &credentials, roster)
        .context("Failed to initialize verification backends")?;
    let app = vh_verify::build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on http://{}", addr);
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
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
