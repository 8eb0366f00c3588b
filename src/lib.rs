//! # OCPI Core - Credentials Exchange and Version Negotiation
//!
//! Implements the OCPI (Open Charge Point Interface) registration handshake
//! by which two charging-network platforms establish mutual trust and agree
//! on a protocol version before any charging data flows.
//!
//! ## Protocol Overview
//!
//! A counterpart registers by sending its own token (B) and versions URL.
//! We call back into its API with token B, pick the configured version,
//! discover its endpoints, store them, and answer with a token (C) the
//! counterpart uses from then on.
//!
//! ```text
//! Counterpart                         Self
//!    |                                  |
//!    |--- POST /credentials {B, url} -->|
//!    |<-- GET url            (Token B) -|  version catalog
//!    |<-- GET version url    (Token B) -|  endpoint set
//!    |                                  |  persist record, issue C
//!    |<-- 1000 {token: C, url, roles} --|
//!    |                                  |
//!    |--- PUT /credentials {B, url} --->|  re-register: same walk,
//!    |<-- 1000 {token: C', ...} --------|  record updated, C rotated
//! ```
//!
//! ### Registration States
//!
//! | Request | Record exists | Result                                   |
//! |---------|---------------|------------------------------------------|
//! | POST    | no            | handshake, record created                |
//! | POST    | yes           | HTTP 405                                 |
//! | PUT     | yes           | handshake, record updated, token rotated |
//! | PUT     | no            | HTTP 405                                 |
//!
//! ### Status Codes
//!
//! | Code   | Meaning                                   |
//! |--------|-------------------------------------------|
//! | `1000` | Success                                   |
//! | `2000` | Generic client error                      |
//! | `3000` | Generic server error                      |
//! | `3001` | Unable to use the counterpart's API       |
//! | `3002` | Counterpart does not offer our version    |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ocpi::{
//!     HttpCounterpartClient, MemoryStorage, RegistrationHandshake, SchemaAdapter,
//!     VersionNumber, config::Config,
//! };
//!
//! let config = Config::default();
//! let handshake = RegistrationHandshake::new(
//!     Arc::new(MemoryStorage::new()),
//!     Arc::new(HttpCounterpartClient::new(config.client.timeout())?),
//!     Arc::new(SchemaAdapter::new()),
//!     config.identity(),
//! );
//!
//! let outcome = handshake
//!     .register("token-b", "https://emsp.example/ocpi/versions", VersionNumber::V2_2_1)
//!     .await?;
//! println!("issued {}", outcome.self_token);
//! ```
//!
//! ## Modules
//!
//! - [`handshake`]: Registration orchestrator
//! - [`client`]: Outbound calls to the counterpart
//! - [`storage`]: Credentials persistence boundary
//! - [`versions`]: Version catalog and endpoint types
//! - [`credentials`]: Credentials records and wire object
//! - [`adapter`]: Version-specific object shaping
//! - [`server`]: HTTP API server (Axum-based)
//! - [`transport`]: Network binding for the server
//! - [`config`]: Configuration management
//! - [`error`]: Error types and result aliases

pub mod adapter;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod handshake;
pub mod server;
pub mod status;
pub mod storage;
pub mod transport;
pub mod versions;

// Re-exports for convenience
pub use adapter::{Adapter, AdapterError, ObjectKind, SchemaAdapter};
pub use client::{ClientError, CounterpartClient, HttpCounterpartClient};
pub use config::Config;
pub use credentials::{Credentials, CredentialsRecord};
pub use error::{OcpiError, Result};
pub use handshake::{HandshakeError, HandshakeOutcome, PartyIdentity, RegistrationHandshake};
pub use server::{AppState, ServerConfig};
pub use status::OcpiStatus;
pub use storage::{MemoryStorage, StorageError, StorageGateway};
pub use transport::{TcpTransport, Transport};
pub use versions::{EndpointSet, VersionCatalog, VersionNumber};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
