use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod loader;
mod models;
mod review;
mod routes;
mod sessions;
mod state;
mod views;
mod writer;

use common::database::{StoreConfig, health_check, init_store};
use tokio::net::TcpListener;

use crate::{config::ServiceConfig, sessions::SessionRegistry, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting review service");

    let service_config = ServiceConfig::load()?;
    let store_config = StoreConfig::from_env()?;

    // Initialize the process store
    let store = init_store(&store_config).await?;
    if health_check(store.as_ref()).await {
        info!("{} store connection successful", store.backend_name());
    } else {
        anyhow::bail!("Failed to connect to {} store", store.backend_name());
    }

    let sessions = SessionRegistry::new(service_config.session_ttl());
    sessions.spawn_sweeper(service_config.sweep_interval());

    let app_state = AppState { store, sessions };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = TcpListener::bind(&service_config.bind_address).await?;
    info!("Review service listening on {}", service_config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutting down review service");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
