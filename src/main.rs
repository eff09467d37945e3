use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tinylink::api;
use tinylink::auth::AuthService;
use tinylink::config::Config;
use tinylink::seed::seed_demo_data;
use tinylink::state::AppState;
use tinylink::storage::{MemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "tinylink")]
#[command(about = "Session-authenticated URL shortener", long_about = None)]
struct Cli {
    /// Listen address (overrides HOST)
    #[arg(long)]
    host: Option<String>,
    /// Listen port (overrides PORT)
    #[arg(long)]
    port: Option<u16>,
    /// Seed the demo accounts and links (same as SEED_DEMO_DATA=true)
    #[arg(long)]
    seed_demo: bool,
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    config.seed_demo_data |= cli.seed_demo;
    info!("Loaded configuration");

    // Data lives only as long as the process
    let storage: Arc<dyn Storage> = Arc::new(MemoryStorage::new());
    if config.seed_demo_data {
        seed_demo_data(storage.as_ref()).await?;
    }

    let auth_service = Arc::new(AuthService::new(&config.session)?);
    info!("🔐 Session cookies signed with {:?}", config.session.mode);

    let state = Arc::new(AppState::new(storage, auth_service, &config));
    let app = api::create_app(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 TinyLink listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
