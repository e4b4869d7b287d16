//! Serve command - runs the customer directory API

use tokio::net::TcpListener;
use tracing::info;

use crate::api::create_router_with_state;

/// Run the API server until interrupted
pub async fn run() -> anyhow::Result<()> {
    let config = super::bootstrap()?;

    let state = crate::create_app_state_with_config(&config).await?;
    let app = create_router_with_state(state);

    let addr = config.bind_address()?;
    info!("Starting customer directory on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
}
