//! Transport layer for the OCPI server.
//!
//! The router is transport-agnostic; a [`Transport`] binds it to the network.
//! Only plain TCP/HTTP is provided. TLS is expected to terminate in front of
//! the service.

mod tcp;

pub use tcp::TcpTransport;

use crate::error::Result;
use axum::Router;
use std::future::Future;
use std::pin::Pin;

/// Transport trait for pluggable network backends.
///
/// Implementations handle the low-level network protocol while
/// the server remains transport-agnostic.
pub trait Transport: Send + Sync {
    /// Serve the given Axum router on this transport.
    ///
    /// Runs until the process receives Ctrl-C.
    fn serve(&self, router: Router) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;

    /// Get the transport name for logging.
    fn name(&self) -> &'static str;

    /// Get the listen address as a string.
    fn listen_addr(&self) -> String;
}
