use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use server::config::{AppConfig, DatabaseBackend};
use server::repository::{MemoryRepository, SeaRepository};
use server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let config = AppConfig::load().context("Failed to load config")?;

    let media = config
        .storage
        .build()
        .await
        .context("Failed to initialize media store")?;
    info!(backend = ?config.storage.backend, "Media store ready");

    let state = match config.database.backend {
        DatabaseBackend::Postgres => {
            let db = server::database::init_db(&config.database.url)
                .await
                .context("Failed to connect to database")?;
            info!("Database connected, schema synced");
            let repo = Arc::new(SeaRepository::new(db));
            AppState::new(config.clone(), repo.clone(), repo, media)
        }
        DatabaseBackend::Memory => {
            info!("Using in-memory row store; data is lost on exit");
            let repo = Arc::new(MemoryRepository::new());
            AppState::new(config.clone(), repo.clone(), repo, media)
        }
    };

    let app = server::build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!("Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
