//! Configuration management.
//!
//! Supports configuration from:
//! - TOML config files
//! - Environment variables
//! - CLI arguments (for the server)

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::{BusinessDetails, CredentialsRole, Role};
use crate::error::{OcpiError, Result};
use crate::handshake::PartyIdentity;
use crate::versions::VersionNumber;

/// Main configuration struct
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerSection,

    /// Our party identity
    #[serde(default)]
    pub party: PartyConfig,

    /// Outbound client configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Registration policy
    #[serde(default)]
    pub registration: RegistrationConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| OcpiError::Config(format!("Failed to read config file: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| OcpiError::Config(format!("Failed to parse config: {e}")))
    }

    /// Default config file location (`<config dir>/ocpi/config.toml`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("ocpi").join("config.toml"))
    }

    /// Load `path` (or the default path) if it exists, then apply env overrides.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let base = match path.or_else(Self::default_path) {
            Some(path) if path.exists() => Self::from_file(path)?,
            _ => Self::default(),
        };
        base.apply_env()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().apply_env()
    }

    /// Override fields from `OCPI_*` environment variables
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(host) = std::env::var("OCPI_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("OCPI_PORT") {
            self.server.port = port
                .parse()
                .map_err(|e| OcpiError::Config(format!("Invalid OCPI_PORT: {e}")))?;
        }
        if let Ok(base_url) = std::env::var("OCPI_BASE_URL") {
            self.server.base_url = base_url;
        }
        if let Ok(secs) = std::env::var("OCPI_CLIENT_TIMEOUT_SECS") {
            self.client.timeout_secs = secs
                .parse()
                .map_err(|e| OcpiError::Config(format!("Invalid OCPI_CLIENT_TIMEOUT_SECS: {e}")))?;
        }
        if let Ok(version) = std::env::var("OCPI_VERSION") {
            self.registration.version = version.parse().map_err(OcpiError::Config)?;
        }
        if let Ok(tokens) = std::env::var("OCPI_REGISTRATION_TOKENS") {
            self.registration.tokens = tokens
                .split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from)
                .collect();
        }
        self.client.validate()?;
        Ok(self)
    }

    /// Identity published in our credentials object
    pub fn identity(&self) -> PartyIdentity {
        PartyIdentity {
            versions_url: self.server.versions_url(),
            roles: vec![self.party.credentials_role()],
        }
    }
}

/// HTTP server section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Public URL prefix under which this service is reachable
    pub base_url: String,

    /// Maximum request body size in bytes
    pub max_body_size: usize,

    /// Enable request logging
    pub logging: bool,

    /// Enable permissive CORS
    pub cors: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            base_url: "http://127.0.0.1:8080/ocpi".to_string(),
            max_body_size: 1024 * 1024, // 1 MB
            logging: true,
            cors: false,
        }
    }
}

impl ServerSection {
    /// Get the full listen address
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Our versions URL
    pub fn versions_url(&self) -> String {
        format!("{}/versions", self.base_url.trim_end_matches('/'))
    }
}

/// Our own party identity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    /// ISO-3166 alpha-2 country code
    pub country_code: String,

    /// Three-character party id
    pub party_id: String,

    /// Role we play
    pub role: Role,

    /// Business name
    pub business_name: String,

    /// Public website
    pub website: Option<String>,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            country_code: "NL".to_string(),
            party_id: "OCP".to_string(),
            role: Role::Cpo,
            business_name: "OCPI Core".to_string(),
            website: None,
        }
    }
}

impl PartyConfig {
    /// Credentials role entry for this party
    pub fn credentials_role(&self) -> CredentialsRole {
        CredentialsRole {
            role: self.role,
            business_details: BusinessDetails {
                name: self.business_name.clone(),
                website: self.website.clone(),
            },
            party_id: self.party_id.clone(),
            country_code: self.country_code.clone(),
        }
    }
}

/// Outbound client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Timeout for each counterpart call in seconds
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl ClientConfig {
    /// Timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// A zero timeout would fail every counterpart call
    pub fn validate(&self) -> Result<()> {
        if self.timeout_secs == 0 {
            return Err(OcpiError::Config(
                "client.timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Registration policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Version negotiated with every counterpart
    pub version: VersionNumber,

    /// Tokens accepted on `POST /credentials`; empty accepts any bearer token
    pub tokens: Vec<String>,
}
