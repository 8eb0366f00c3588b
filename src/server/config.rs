//! Server configuration.

use std::net::SocketAddr;

use crate::config::Config;
use crate::error::{OcpiError, Result};
use crate::versions::VersionNumber;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub addr: SocketAddr,
    /// Public URL prefix, e.g. `https://cpo.example/ocpi`
    pub base_url: String,
    /// Version negotiated with counterparts
    pub version: VersionNumber,
    /// Tokens accepted on `POST /credentials` (empty = any)
    pub registration_tokens: Vec<String>,
    /// Maximum request body size (bytes)
    pub max_body_size: usize,
    /// Enable request logging
    pub logging: bool,
    /// CORS enabled
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080/ocpi".to_string(),
            version: VersionNumber::default(),
            registration_tokens: Vec::new(),
            max_body_size: 1024 * 1024, // 1MB
            logging: true,
            cors_enabled: false,
        }
    }
}

impl ServerConfig {
    /// Build from the file/env configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        config.client.validate()?;
        let addr: SocketAddr = config.server.listen_addr().parse().map_err(|e| {
            OcpiError::Config(format!(
                "Invalid listen address {}: {e}",
                config.server.listen_addr()
            ))
        })?;

        let server = Self {
            addr,
            base_url: config.server.base_url.clone(),
            version: config.registration.version,
            registration_tokens: config.registration.tokens.clone(),
            max_body_size: config.server.max_body_size,
            logging: config.server.logging,
            cors_enabled: config.server.cors,
        };
        server.path_prefix()?;
        Ok(server)
    }

    /// Set address directly
    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    /// Set public base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set negotiated version
    pub fn with_version(mut self, version: VersionNumber) -> Self {
        self.version = version;
        self
    }

    /// Restrict registration to the given tokens
    pub fn with_registration_tokens(mut self, tokens: Vec<String>) -> Self {
        self.registration_tokens = tokens;
        self
    }

    /// Disable logging
    pub fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Trimmed base URL
    pub fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// URL path the router is mounted under (`""` for the root)
    pub fn path_prefix(&self) -> Result<String> {
        let url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| OcpiError::Config(format!("Invalid base_url {}: {e}", self.base_url)))?;
        Ok(url.path().trim_end_matches('/').to_string())
    }

    /// Whether `token` may start a registration
    pub fn accepts_registration(&self, token: &str) -> bool {
        self.registration_tokens.is_empty() || self.registration_tokens.iter().any(|t| t == token)
    }
}
