use std::net::SocketAddr;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{config::ApiServerConfig, errors::Error};

use super::routes::{build_router, ApiState};

pub async fn start_api_server(config: ApiServerConfig, state: ApiState) -> crate::Result<()> {
    let addr: SocketAddr = config
        .socket_address()
        .parse()
        .map_err(|e| Error::config(format!("Invalid API address: {}", e)))?;

    let shutdown = state.shutdown.clone();
    let router = build_router(state);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| Error::transport(format!("Failed to bind API server: {}", e)))?;

    info!(address = %addr, "Starting HTTP API server");
    run_http_server(listener, router, shutdown).await?;

    info!("API server shutdown completed");
    Ok(())
}

/// Serve until ctrl-c or until `shutdown` is cancelled elsewhere.
///
/// Either way `shutdown` ends up cancelled, which aborts store calls still in
/// flight while connections drain.
pub async fn run_http_server(
    listener: TcpListener,
    router: Router,
    shutdown: CancellationToken,
) -> crate::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => {
                    if let Err(e) = result {
                        warn!(error = %e, "API server shutdown listener failed");
                    }
                }
                _ = shutdown.cancelled() => {}
            }
            shutdown.cancel();
        })
        .await
        .map_err(|e| Error::transport(format!("API server error: {}", e)))
}
