//! `linkpack serve` – run the HTTP server with graceful shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use linkpack_core::config::LinkpackConfig;
use linkpack_core::TaskService;
use tokio::net::TcpListener;
#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

use crate::http;

/// How long to wait for running builds after the listener stops. Builds still
/// running afterwards are abandoned when the runtime shuts down.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn run_serve(cfg: LinkpackConfig) -> Result<()> {
    let service = Arc::new(TaskService::from_config(&cfg));
    let app = http::router(Arc::clone(&service));

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(
        %addr,
        archive_dir = %cfg.archive_dir.display(),
        max_tasks = cfg.max_tasks,
        max_links_per_task = cfg.max_links_per_task,
        "linkpack server listening"
    );
    println!("linkpack listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server")?;

    tracing::info!(pending = service.scheduler().pending(), "draining builds");
    if tokio::time::timeout(DRAIN_TIMEOUT, service.shutdown())
        .await
        .is_err()
    {
        tracing::warn!(
            pending = service.scheduler().pending(),
            "builds still running at shutdown, abandoning them"
        );
    }
    tracing::info!("linkpack server stopped");
    Ok(())
}

/// Resolves on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
///
/// The SIGTERM listener is registered before this returns, so a signal that
/// arrives before the future is first polled is not lost.
fn shutdown_signal() -> impl Future<Output = ()> {
    #[cfg(unix)]
    let sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::error!("listen for SIGTERM: {}", e);
            None
        }
    };

    async move {
        let interrupt = async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("received SIGINT, shutting down"),
                Err(e) => {
                    tracing::error!("listen for SIGINT: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(unix)]
        let terminate = async move {
            match sigterm {
                Some(mut sigterm) => {
                    sigterm.recv().await;
                    tracing::info!("received SIGTERM, shutting down");
                }
                None => std::future::pending::<()>().await,
            }
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            () = interrupt => {}
            () = terminate => {}
        }
    }
}
