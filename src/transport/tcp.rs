//! TCP transport implementation.
//!
//! HTTP/1.1 over TCP using Axum's built-in server, with graceful shutdown
//! on Ctrl-C.

use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;

use axum::Router;
use tokio::net::TcpListener;

use super::Transport;
use crate::error::{OcpiError, Result};

/// TCP/HTTP transport using Axum's built-in server.
#[derive(Debug, Clone)]
pub struct TcpTransport {
    /// Address to listen on.
    listen_addr: SocketAddr,
}

impl TcpTransport {
    /// Create a new TCP transport.
    pub fn new(listen_addr: SocketAddr) -> Self {
        Self { listen_addr }
    }

    /// Serve on an already bound listener (useful with port 0).
    pub async fn serve_listener(listener: TcpListener, router: Router) -> Result<()> {
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| OcpiError::Server(format!("TCP server error: {e}")))
    }
}

impl Transport for TcpTransport {
    fn serve(
        &self,
        router: Router,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let addr = self.listen_addr;

        Box::pin(async move {
            tracing::info!("TCP transport listening on {}", addr);

            let listener = TcpListener::bind(addr).await.map_err(|e| {
                OcpiError::Server(format!("Failed to bind TCP to {addr}: {e}"))
            })?;

            Self::serve_listener(listener, router).await?;
            tracing::info!("TCP transport stopped");
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "TCP/HTTP"
    }

    fn listen_addr(&self) -> String {
        format!("http://{}", self.listen_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to install Ctrl-C handler: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
