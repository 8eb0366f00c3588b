//! Credentials records and the OCPI credentials wire object.

use serde::{Deserialize, Serialize};

use crate::versions::{EndpointSet, VersionNumber};

/// Persisted state of one counterpart relationship.
///
/// Keyed by `counterpart_token`. Created on the first successful
/// registration, updated in place on re-registration, and never removed by
/// the handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRecord {
    /// Token the counterpart issued to us; we use it to call them
    pub counterpart_token: String,
    /// Token we issued to the counterpart.
    ///
    /// `None` only between the credentials write and the registration write
    /// of a handshake.
    pub self_token: Option<String>,
    /// Agreed protocol version
    pub negotiated_version: VersionNumber,
    /// Counterpart's endpoints for `negotiated_version`
    pub endpoints: EndpointSet,
}

/// Party roles from the OCPI role enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Charge Point Operator
    #[default]
    Cpo,
    /// e-Mobility Service Provider
    Emsp,
    /// Hub
    Hub,
    /// National Access Point
    Nap,
    /// Navigation Service Provider
    Nsp,
    /// Other
    Other,
    /// Smart Charging Service Provider
    Scsp,
}

/// Business details published with a credentials role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessDetails {
    /// Operator name
    pub name: String,
    /// Public website
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// One role a party plays on the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsRole {
    /// Role type
    pub role: Role,
    /// Business details for this role
    pub business_details: BusinessDetails,
    /// Three-character party id
    pub party_id: String,
    /// ISO-3166 alpha-2 country code
    pub country_code: String,
}

/// OCPI credentials object as exchanged on the wire.
///
/// Inbound `POST`/`PUT` bodies only need `token` and `url`; `roles` defaults
/// to empty so minimal bodies are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Bearer token the recipient must use to call the sender
    pub token: String,
    /// Sender's versions URL
    pub url: String,
    /// Roles hosted by the sender
    #[serde(default)]
    pub roles: Vec<CredentialsRole>,
}

/// Generate a fresh opaque bearer token.
pub fn generate_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Shorten a token for log output.
pub(crate) fn redact(token: &str) -> String {
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}…")
}
