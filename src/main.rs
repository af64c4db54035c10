use std::net::SocketAddr;
use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use nasa_or_not::config::AppConfig;
use nasa_or_not::providers::{ApodProvider, DalleClient, ImageSynthesizer, NasaApodClient};
use nasa_or_not::services::AppState;
use nasa_or_not::{db, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    dotenvy::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.server.rust_log))
        .init();

    tracing::info!("Starting nasa-or-not...");

    // 3. Initialize database
    let conn = db::connect(&config.database).await?;
    db::ensure_schema(&conn).await?;
    let repo = db::Repository::new(conn.clone());

    // 4. Initialize provider clients
    let apod: Arc<dyn ApodProvider> = Arc::new(NasaApodClient::new(config.apod.clone())?);
    let synthesizer: Arc<dyn ImageSynthesizer> = Arc::new(DalleClient::new(config.synthesis.clone())?);

    // 5. App state and router
    let state = AppState::new(repo, apod, synthesizer);
    let app = routes::create_router(state, config.request_timeout());

    // 6. Start server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db::shutdown(conn).await;
    tracing::info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
