//! OCPI version catalog and endpoint discovery types.
//!
//! Every OCPI party publishes a *versions* URL listing the protocol versions
//! it speaks, and for each version a *details* URL listing the modules it
//! exposes. The handshake walks both:
//!
//! ```text
//! GET <versions url>        -> [{version, url}, ...]        (VersionCatalog)
//! GET <url of chosen entry> -> {version, endpoints: [...]}  (VersionDetails)
//! ```
//!
//! An [`EndpointSet`] only exists once a version has been chosen, so it always
//! carries that version with it.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// OCPI protocol versions this crate knows how to negotiate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VersionNumber {
    /// OCPI 2.0
    #[serde(rename = "2.0")]
    V2_0,
    /// OCPI 2.1
    #[serde(rename = "2.1")]
    V2_1,
    /// OCPI 2.1.1
    #[serde(rename = "2.1.1")]
    V2_1_1,
    /// OCPI 2.2
    #[serde(rename = "2.2")]
    V2_2,
    /// OCPI 2.2.1
    #[default]
    #[serde(rename = "2.2.1")]
    V2_2_1,
}

impl VersionNumber {
    /// All known versions, oldest first.
    pub const ALL: [VersionNumber; 5] = [
        VersionNumber::V2_0,
        VersionNumber::V2_1,
        VersionNumber::V2_1_1,
        VersionNumber::V2_2,
        VersionNumber::V2_2_1,
    ];

    /// Wire identifier, e.g. `"2.2.1"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionNumber::V2_0 => "2.0",
            VersionNumber::V2_1 => "2.1",
            VersionNumber::V2_1_1 => "2.1.1",
            VersionNumber::V2_2 => "2.2",
            VersionNumber::V2_2_1 => "2.2.1",
        }
    }

    /// 2.2 introduced multi-role credentials (`roles` array).
    pub fn has_roles(&self) -> bool {
        matches!(self, VersionNumber::V2_2 | VersionNumber::V2_2_1)
    }
}

impl fmt::Display for VersionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VersionNumber {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        VersionNumber::ALL
            .into_iter()
            .find(|v| v.as_str() == s.trim())
            .ok_or_else(|| format!("unknown OCPI version: {s}"))
    }
}

/// One `{version, url}` pair from a versions listing.
///
/// The identifier is kept as a raw string: a counterpart may advertise
/// versions this build has never heard of, and that must not make the
/// whole listing unreadable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Version identifier as sent by the counterpart
    pub version: String,
    /// URL of the version details (endpoint list)
    pub url: String,
}

impl VersionEntry {
    /// Create an entry for a known version
    pub fn new(version: VersionNumber, url: impl Into<String>) -> Self {
        Self {
            version: version.as_str().to_string(),
            url: url.into(),
        }
    }
}

/// Ordered set of versions a party claims to support.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VersionCatalog {
    entries: Vec<VersionEntry>,
}

impl VersionCatalog {
    /// Build a catalog, rejecting duplicate version identifiers.
    pub fn new(entries: Vec<VersionEntry>) -> Result<Self, String> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.version.as_str()) {
                return Err(format!("duplicate version in catalog: {}", entry.version));
            }
        }
        Ok(Self { entries })
    }

    /// Entries in the order the counterpart listed them
    pub fn entries(&self) -> &[VersionEntry] {
        &self.entries
    }

    /// Find the entry matching `version`, if advertised.
    pub fn select(&self, version: VersionNumber) -> Option<&VersionEntry> {
        self.entries.iter().find(|e| e.version == version.as_str())
    }

    /// Number of advertised versions
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the counterpart advertised nothing
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Direction a module endpoint serves (OCPI 2.2+).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InterfaceRole {
    /// Party owns the data and serves it
    Sender,
    /// Party accepts pushed data
    Receiver,
}

/// A single module endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    /// Module identifier, e.g. `"locations"`
    pub identifier: String,
    /// Interface role; absent before OCPI 2.2
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<InterfaceRole>,
    /// Absolute URL of the module
    pub url: String,
}

/// Body of a version details response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDetails {
    /// Version the endpoints belong to
    #[serde(default)]
    pub version: Option<String>,
    /// Exposed modules
    pub endpoints: Vec<Endpoint>,
}

/// A counterpart's module endpoints for one negotiated version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSet {
    version: VersionNumber,
    endpoints: Vec<Endpoint>,
}

impl EndpointSet {
    /// Bind endpoints to the version they were discovered for.
    ///
    /// Every URL must be absolute.
    pub fn new(version: VersionNumber, endpoints: Vec<Endpoint>) -> Result<Self, String> {
        for endpoint in &endpoints {
            let url = reqwest::Url::parse(&endpoint.url)
                .map_err(|e| format!("endpoint {} has invalid url: {e}", endpoint.identifier))?;
            if url.cannot_be_a_base() {
                return Err(format!(
                    "endpoint {} url is not absolute: {}",
                    endpoint.identifier, endpoint.url
                ));
            }
        }
        Ok(Self { version, endpoints })
    }

    /// Version these endpoints were negotiated for
    pub fn version(&self) -> VersionNumber {
        self.version
    }

    /// All endpoints
    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    /// URL of `module`, preferring no role or SENDER when several are listed.
    pub fn url_for(&self, module: &str) -> Option<&str> {
        let mut matching = self.endpoints.iter().filter(|e| e.identifier == module);
        let first = matching.next()?;
        if first.role == Some(InterfaceRole::Receiver) {
            if let Some(sender) = matching.find(|e| e.role != Some(InterfaceRole::Receiver)) {
                return Some(&sender.url);
            }
        }
        Some(&first.url)
    }

    /// Number of endpoints
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// True when no modules are exposed
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
