//! HTTP server lifecycle

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;

use purse_core::ports::Repository;
use purse_core::services::{LogEvent, LoggingService};
use purse_core::PurseContext;

use crate::routes::router;
use crate::state::AppState;

/// Serve the API until Ctrl-C or SIGTERM, then flush the store
pub async fn serve(
    ctx: Arc<PurseContext>,
    events: Option<Arc<LoggingService>>,
    addr: &str,
) -> Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local_addr = listener.local_addr()?;

    tracing::info!("Purse API listening on http://{}", local_addr);
    record(&events, "server_started");

    axum::serve(listener, router(AppState::new(Arc::clone(&ctx))))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server failed")?;

    tracing::info!("Shutting down, checkpointing database");
    ctx.repository.checkpoint().await?;
    record(&events, "server_stopped");
    Ok(())
}

fn record(events: &Option<Arc<LoggingService>>, event: &str) {
    if let Some(events) = events {
        if let Err(e) = events.log(LogEvent::new(event)) {
            tracing::warn!("Failed to write event log: {}", e);
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
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
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
