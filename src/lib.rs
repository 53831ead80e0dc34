pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod route;
pub mod services;
pub mod utils;

use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::api::AppState;
use crate::config::Settings;
use crate::database::Database;

pub use route::create_rest_router;

const DEFAULT_LOG_FILTER: &str = "branch_chat=info,tower_http=info";

/// Install the global tracing subscriber, honouring `RUST_LOG`
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .try_init()
    {
        // An earlier subscriber stays in charge and receives this warning
        tracing::warn!("Logging already initialised, keeping existing subscriber: {}", e);
    }
}

/// Connect the stores, serve until a shutdown signal, then close the stores
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let database = Database::connect(&settings.storage).await?;
    let address = format!("{}:{}", settings.host, settings.port);

    let router = create_rest_router(AppState::new(settings, &database.stores()));
    let served = start_api_server(&address, router).await;

    database.close().await;
    tracing::info!("Application shutdown complete");
    served
}

async fn start_api_server(address: &str, router: axum::Router) -> anyhow::Result<()> {
    let listener = TcpListener::bind(address).await?;
    tracing::info!("API server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
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
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down...");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal, shutting down...");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice_keeps_first_subscriber() {
        init_logging();
        init_logging();
        tracing::info!("still logging");
    }
}
