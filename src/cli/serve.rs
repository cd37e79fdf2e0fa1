use std::time::Duration;

use crate::api::{self, AppState};
use crate::app::Services;
use crate::cli::commands::ServeArgs;
use crate::cli::load_config;
use crate::errors::GeoError;
use tracing::info;

/// How long live jobs get to persist their cancellation once the server stops.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub async fn handle_serve(args: ServeArgs) -> Result<(), GeoError> {
    let config = load_config(args.config.as_deref(), args.db.as_deref()).await?;
    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    info!(host = %host, port, "Starting API server");

    let services = Services::from_config(&config)?;
    let state = AppState::new(services, config.server.internal_token.clone());
    let app = api::build_router(state.clone());

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    let signalled = state.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
            signalled.cancel_all();
        })
        .await
        .map_err(|e| GeoError::Internal(format!("Server error: {}", e)))?;

    state.shutdown(SHUTDOWN_GRACE).await;
    Ok(())
}
