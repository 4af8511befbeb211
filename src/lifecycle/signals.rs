//! OS signal handling.
//!
//! Ctrl+C (SIGINT) starts a graceful shutdown. Configuration reloads come
//! from the file watcher, not from signals.

use crate::lifecycle::shutdown::Shutdown;

/// Wait for Ctrl+C, then trigger `shutdown`.
///
/// If the handler cannot be installed the server keeps running and must be
/// stopped some other way.
pub async fn shutdown_on_ctrl_c(shutdown: &Shutdown) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
    shutdown.trigger();
}
