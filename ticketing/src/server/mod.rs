//! HTTP server: state, router and graceful shutdown.

pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::build_router;
pub use state::AppState;

use std::time::Duration;
use tokio::net::TcpListener;

/// Serve `router` on `listener` until Ctrl+C (or SIGTERM on Unix).
///
/// In-flight requests get `shutdown_timeout` to finish after the signal.
///
/// # Errors
///
/// Returns an I/O error if the server fails while accepting connections.
pub async fn serve(
    listener: TcpListener,
    router: axum::Router,
    shutdown_timeout: Duration,
) -> std::io::Result<()> {
    let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();

    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signal_tx.send(());
    });

    tokio::select! {
        result = server => result,
        () = async {
            let _ = signal_rx.await;
            tokio::time::sleep(shutdown_timeout).await;
        } => {
            tracing::warn!(timeout_secs = shutdown_timeout.as_secs(), "Graceful shutdown timed out");
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
