//! Server state.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::config::ServerConfig;
use crate::adapter::SchemaAdapter;
use crate::client::HttpCounterpartClient;
use crate::config::Config;
use crate::error::Result;
use crate::handshake::RegistrationHandshake;
use crate::storage::MemoryStorage;

/// Application state shared across handlers
pub struct AppState {
    /// Server configuration
    pub config: ServerConfig,
    /// Credentials handshake
    pub handshake: RegistrationHandshake,
    /// Server start time
    pub start_time: Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(config: ServerConfig, handshake: RegistrationHandshake) -> Self {
        Self {
            config,
            handshake,
            start_time: Instant::now(),
        }
    }

    /// Wire the default collaborators (in-memory storage, HTTP client,
    /// schema adapter) from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let server = ServerConfig::from_config(config)?;
        let client = HttpCounterpartClient::new(config.client.timeout())?;

        let handshake = RegistrationHandshake::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(client),
            Arc::new(SchemaAdapter::new()),
            config.identity(),
        );

        Ok(Self::new(server, handshake))
    }

    /// Get server uptime
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }
}
