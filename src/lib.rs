pub mod config;
pub mod downloader;
pub mod logging;
pub mod relay;

use std::sync::Arc;

use config::Config;
use downloader::backends::Any4kBackend;
use downloader::Orchestrator;
use relay::AppState;

pub type AnyResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Load config, start the HTTP server and serve until Ctrl-C
pub async fn run() -> AnyResult<()> {
    let config = Config::load()?;
    logging::init(&config.logging);

    let backend = Any4kBackend::new(
        config.upstream.base_url.clone(),
        config.upstream.identity(),
        &config.upstream.network(),
    )?;
    tracing::info!("[Server] Upstream: {}", config.upstream.base_url);

    let state = Arc::new(AppState::new(
        Orchestrator::new(Arc::new(backend)),
        config.defaults.clone(),
    ));
    let app = relay::router(state);

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!("[Server] Listening on http://{}", address);
    tracing::info!("[Server]   GET /musica?url=VIDEO_URL");
    tracing::info!("[Server]   GET /clipe?url=VIDEO_URL");
    tracing::info!("[Server]   GET /formats?url=VIDEO_URL");
    tracing::info!("[Server]   GET /info");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("[Server] Stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("[Server] Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
