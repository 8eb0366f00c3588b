//! OCPI HTTP server.
//!
//! Exposes the inbound side of the credentials handshake:
//!
//! | Endpoint               | Method | Description                              |
//! |------------------------|--------|------------------------------------------|
//! | `/versions`            | GET    | Versions we speak                        |
//! | `/versions/:version`   | GET    | Our endpoints for a version              |
//! | `/credentials`         | GET    | Our credentials for the caller           |
//! | `/credentials`         | POST   | Register (405 if already registered)     |
//! | `/credentials`         | PUT    | Re-register (405 if not registered)      |
//! | `/health`              | GET    | Liveness, outside the OCPI prefix        |
//!
//! OCPI routes are mounted under the path of the configured base URL, so a
//! base URL of `https://cpo.example/ocpi` serves `/ocpi/versions`.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use ocpi::{config::Config, server::{create_router, AppState}};
//!
//! let state = Arc::new(AppState::from_config(&Config::default())?);
//! let app = create_router(state);
//! ```

mod auth;
mod config;
mod envelope;
mod handlers;
mod state;

pub use auth::bearer_token;
pub use config::ServerConfig;
pub use envelope::OcpiResponse;
pub use handlers::{create_router, health_check};
pub use state::AppState;
