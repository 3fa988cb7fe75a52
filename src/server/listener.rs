use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpSocket};
use tracing::info;

use crate::config::Config;
use crate::http::connection::Connection;
use crate::server::ServiceContext;

/// Binds the configured address with `SO_REUSEADDR` and the configured
/// backlog.
pub fn bind(cfg: &Config) -> anyhow::Result<TcpListener> {
    let addr = cfg.listen_addr()?;
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()
    } else {
        TcpSocket::new_v6()
    }
    .context("failed to create listening socket")?;

    socket.set_reuseaddr(true)?;
    socket
        .bind(addr)
        .with_context(|| format!("failed to bind {addr}"))?;
    socket
        .listen(cfg.server.backlog)
        .with_context(|| format!("failed to listen on {addr}"))
}

pub async fn run(cfg: &Config, ctx: Arc<ServiceContext>) -> anyhow::Result<()> {
    let listener = bind(cfg)?;
    info!(addr = %listener.local_addr()?, root = %ctx.root.display(), "Listening");
    serve(listener, ctx).await
}

/// Accepts connections until shutdown, serving each one to completion
/// before accepting the next.
pub async fn serve(listener: TcpListener, ctx: Arc<ServiceContext>) -> anyhow::Result<()> {
    let mut shutdown = ctx.shutdown.subscribe();

    loop {
        let (socket, peer) = tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                    continue;
                }
            },
            _ = shutdown.recv() => {
                info!("Shutdown signal received, no longer accepting");
                return Ok(());
            }
        };
        info!(%peer, "Accepted connection");

        let mut conn = Connection::new(socket, Arc::clone(&ctx));
        let served = match ctx.io_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.run()).await {
                Ok(res) => res,
                Err(_) => {
                    tracing::warn!(%peer, ?limit, "connection timed out, dropping it");
                    Ok(())
                }
            },
            None => conn.run().await,
        };

        if let Err(e) = served {
            tracing::debug!(%peer, error = %e, "connection ended with error");
        }
    }
}
