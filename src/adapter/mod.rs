//! Version-specific shaping of OCPI objects.
//!
//! The handshake stores and returns plain JSON mappings; an [`Adapter`]
//! turns such a mapping into the schema a given protocol version expects.
//! Adaptation is pure: same input and version, same output, no I/O.
//!
//! | Kind                 | Required keys      | Pre-2.2 shaping                    |
//! |----------------------|--------------------|------------------------------------|
//! | `credentials`        | `token`, `url`     | first role flattened to top level  |
//! | `location`           | `id`               | `country_code`/`party_id` dropped  |
//! | `session`            | `id`               | `country_code`/`party_id` dropped  |
//! | `cdr`                | `id`               | `country_code`/`party_id` dropped  |
//! | `token`              | `uid`              | `country_code`/`party_id` dropped  |
//! | `command`            | (object)           | unchanged                          |
//! | `charging_preference`| (object)           | unchanged                          |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::credentials::Credentials;
use crate::versions::VersionNumber;

/// OCPI object kinds with an adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// Location
    Location,
    /// Charging session
    Session,
    /// Smart-charging preferences
    ChargingPreference,
    /// Credentials
    Credentials,
    /// Charge detail record
    Cdr,
    /// Command
    Command,
    /// Token
    Token,
}

impl ObjectKind {
    /// Key that must be present, if any
    fn required_key(self) -> Option<&'static str> {
        match self {
            ObjectKind::Location | ObjectKind::Session | ObjectKind::Cdr => Some("id"),
            ObjectKind::Token => Some("uid"),
            ObjectKind::Credentials | ObjectKind::Command | ObjectKind::ChargingPreference => None,
        }
    }

    /// Kinds that gained `country_code`/`party_id` in 2.2
    fn is_party_scoped(self) -> bool {
        matches!(
            self,
            ObjectKind::Location | ObjectKind::Session | ObjectKind::Cdr | ObjectKind::Token
        )
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectKind::Location => "location",
            ObjectKind::Session => "session",
            ObjectKind::ChargingPreference => "charging_preference",
            ObjectKind::Credentials => "credentials",
            ObjectKind::Cdr => "cdr",
            ObjectKind::Command => "command",
            ObjectKind::Token => "token",
        };
        f.write_str(name)
    }
}

/// Adaptation failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdapterError {
    /// Data cannot be shaped into the requested schema.
    #[error("{kind} does not fit the {version} schema: {reason}")]
    SchemaValidation {
        /// Object kind being adapted
        kind: ObjectKind,
        /// Target version
        version: VersionNumber,
        /// What was wrong
        reason: String,
    },
}

/// Shapes raw object data for a protocol version.
pub trait Adapter: Send + Sync {
    /// Adapt `data` of `kind` to the schema of `version`.
    fn adapt(
        &self,
        kind: ObjectKind,
        data: &Value,
        version: VersionNumber,
    ) -> Result<Value, AdapterError>;
}

/// Built-in adapter covering every [`ObjectKind`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaAdapter;

impl SchemaAdapter {
    /// Create the adapter
    pub fn new() -> Self {
        Self
    }

    fn credentials(data: &Value, version: VersionNumber) -> Result<Value, AdapterError> {
        let invalid = |reason: String| AdapterError::SchemaValidation {
            kind: ObjectKind::Credentials,
            version,
            reason,
        };

        let credentials: Credentials =
            serde_json::from_value(data.clone()).map_err(|e| invalid(e.to_string()))?;

        if credentials.token.is_empty() {
            return Err(invalid("token is empty".to_string()));
        }

        if version.has_roles() {
            return serde_json::to_value(&credentials).map_err(|e| invalid(e.to_string()));
        }

        // 2.0/2.1.x carry a single party at the top level
        let role = credentials
            .roles
            .first()
            .ok_or_else(|| invalid("at least one role is required".to_string()))?;

        Ok(json!({
            "token": credentials.token,
            "url": credentials.url,
            "business_details": role.business_details,
            "party_id": role.party_id,
            "country_code": role.country_code,
        }))
    }

    fn object(kind: ObjectKind, data: &Value, version: VersionNumber) -> Result<Value, AdapterError> {
        let invalid = |reason: String| AdapterError::SchemaValidation {
            kind,
            version,
            reason,
        };

        let object: &Map<String, Value> = data
            .as_object()
            .ok_or_else(|| invalid("expected a JSON object".to_string()))?;

        if let Some(key) = kind.required_key() {
            if !object.contains_key(key) {
                return Err(invalid(format!("missing required field `{key}`")));
            }
        }

        let mut shaped = object.clone();
        if kind.is_party_scoped() && !version.has_roles() {
            shaped.remove("country_code");
            shaped.remove("party_id");
        }
        Ok(Value::Object(shaped))
    }
}

impl Adapter for SchemaAdapter {
    fn adapt(
        &self,
        kind: ObjectKind,
        data: &Value,
        version: VersionNumber,
    ) -> Result<Value, AdapterError> {
        match kind {
            ObjectKind::Credentials => Self::credentials(data, version),
            _ => Self::object(kind, data, version),
        }
    }
}
