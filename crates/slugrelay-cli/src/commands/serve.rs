use std::net::SocketAddr;
use std::path::Path;

use anyhow::Context;
use slugrelay::AppState;
use slugrelay_core::RelayConfig;

pub async fn serve(config_path: &Path, bind: Option<SocketAddr>) -> anyhow::Result<()> {
    let mut config = RelayConfig::load(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }

    let state = AppState::from_config(&config)?;
    let app = slugrelay::router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.server.bind))?;
    tracing::info!(
        addr = %listener.local_addr()?,
        clouds = ?config.clouds.keys().collect::<Vec<_>>(),
        "slugrelay listening",
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("slugrelay stopped");
    Ok(())
}

async fn shutdown_signal() {
    // arch-lint: allow(no-error-swallowing) reason="without a signal handler the server runs until killed"
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
