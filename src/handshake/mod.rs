//! Credentials registration handshake.
//!
//! Drives a [`CounterpartClient`] and a [`StorageGateway`] through version
//! negotiation, endpoint discovery and token exchange.
//!
//! ```text
//!  counterpart                      self (RegistrationHandshake)
//!      |                                 |
//!      |-- POST/PUT /credentials ------->|  {token: B, url}
//!      |                                 |  storage.get(B)        (405 on conflict)
//!      |<------ GET url (Token B) -------|  version catalog
//!      |                                 |  select requested version (3002 if absent)
//!      |<-- GET version url (Token B) ---|  endpoint set
//!      |                                 |  storage.create/update  (credentials write)
//!      |                                 |  storage.issue_token(C) (registration write, CAS)
//!      |<------- {token: C, ...} --------|
//! ```
//!
//! Nothing is written until both fetches have succeeded, so a failed
//! handshake leaves prior state untouched. If the registration write fails
//! after a `create`, the record is removed again. The orchestrator holds no state
//! between calls; handshakes for different counterparts are independent.

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use serde_json::{json, Value};
use thiserror::Error;

use crate::adapter::{Adapter, AdapterError, ObjectKind};
use crate::client::{ClientError, CounterpartClient};
use crate::credentials::{generate_token, redact, CredentialsRecord, CredentialsRole};
use crate::status::OcpiStatus;
use crate::storage::{CounterpartCredentials, StorageError, StorageGateway};
use crate::versions::{EndpointSet, VersionNumber};

/// Handshake failures, as surfaced to the transport layer.
#[derive(Error, Debug)]
pub enum HandshakeError {
    /// Registration attempted for a counterpart that already has a record.
    #[error("Client is already registered")]
    AlreadyRegistered,

    /// Re-registration attempted for a counterpart without a record.
    #[error("Client is not registered")]
    NotRegistered,

    /// Counterpart does not advertise the requested version.
    #[error("Counterpart does not support version {requested}")]
    UnsupportedVersion {
        /// Version we tried to negotiate
        requested: VersionNumber,
    },

    /// Transport failure, non-success status or malformed body.
    #[error("Unable to use counterpart API: {0}")]
    CounterpartUnreachableOrInvalid(#[source] ClientError),

    /// Stored or fetched data does not fit the expected schema.
    #[error("Schema validation failed: {0}")]
    SchemaValidationFailure(#[from] AdapterError),

    /// Storage backend failure.
    #[error("Storage error: {0}")]
    Storage(#[source] StorageError),
}

impl HandshakeError {
    /// OCPI status code reported for this failure
    pub fn ocpi_status(&self) -> OcpiStatus {
        match self {
            HandshakeError::AlreadyRegistered | HandshakeError::NotRegistered => {
                OcpiStatus::GenericClientError
            },
            HandshakeError::UnsupportedVersion { .. } => OcpiStatus::UnsupportedVersion,
            HandshakeError::CounterpartUnreachableOrInvalid(_)
            | HandshakeError::SchemaValidationFailure(_) => OcpiStatus::UnableToUseClientsApi,
            HandshakeError::Storage(_) => OcpiStatus::GenericServerError,
        }
    }

    /// HTTP status carrying the envelope for this failure
    pub fn http_status(&self) -> StatusCode {
        match self {
            _ if self.is_registration_conflict() => StatusCode::METHOD_NOT_ALLOWED,
            HandshakeError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::OK,
        }
    }

    /// Registration-state precondition violated
    pub fn is_registration_conflict(&self) -> bool {
        matches!(
            self,
            HandshakeError::AlreadyRegistered | HandshakeError::NotRegistered
        )
    }
}

impl From<ClientError> for HandshakeError {
    fn from(err: ClientError) -> Self {
        HandshakeError::CounterpartUnreachableOrInvalid(err)
    }
}

impl From<StorageError> for HandshakeError {
    fn from(err: StorageError) -> Self {
        HandshakeError::Storage(err)
    }
}

/// Who we are, as published in our credentials object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartyIdentity {
    /// Our versions URL
    pub versions_url: String,
    /// Roles we host
    pub roles: Vec<CredentialsRole>,
}

/// Result of a successful handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct HandshakeOutcome {
    /// Token newly issued to the counterpart
    pub self_token: String,
    /// Negotiated version
    pub version: VersionNumber,
    /// Our credentials object, adapted to `version`
    pub credentials: Value,
}

#[derive(Clone, Copy)]
enum Mode {
    Register,
    Reregister,
}

/// Registration orchestrator.
#[derive(Clone)]
pub struct RegistrationHandshake {
    storage: Arc<dyn StorageGateway>,
    client: Arc<dyn CounterpartClient>,
    adapter: Arc<dyn Adapter>,
    identity: PartyIdentity,
    call_timeout: Option<Duration>,
}

impl RegistrationHandshake {
    /// Create an orchestrator over the given collaborators
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        client: Arc<dyn CounterpartClient>,
        adapter: Arc<dyn Adapter>,
        identity: PartyIdentity,
    ) -> Self {
        Self {
            storage,
            client,
            adapter,
            identity,
            call_timeout: None,
        }
    }

    /// Bound each outbound call, independent of the client's own timeout.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Our published identity
    pub fn identity(&self) -> &PartyIdentity {
        &self.identity
    }

    /// First-time registration of `counterpart_token`.
    pub async fn register(
        &self,
        counterpart_token: &str,
        counterpart_url: &str,
        requested: VersionNumber,
    ) -> Result<HandshakeOutcome, HandshakeError> {
        self.run(Mode::Register, counterpart_token, counterpart_url, requested)
            .await
    }

    /// Credential refresh for an already registered `counterpart_token`.
    ///
    /// Version and endpoints are replaced and a new token is issued.
    pub async fn reregister(
        &self,
        counterpart_token: &str,
        counterpart_url: &str,
        requested: VersionNumber,
    ) -> Result<HandshakeOutcome, HandshakeError> {
        self.run(Mode::Reregister, counterpart_token, counterpart_url, requested)
            .await
    }

    /// Stored record for `counterpart_token`. No network calls.
    pub async fn fetch_credentials(
        &self,
        counterpart_token: &str,
    ) -> Result<Option<CredentialsRecord>, HandshakeError> {
        Ok(self.storage.get(counterpart_token).await?)
    }

    /// Record whose issued token is `self_token`.
    pub async fn resolve_issued(
        &self,
        self_token: &str,
    ) -> Result<Option<CredentialsRecord>, HandshakeError> {
        Ok(self.storage.find_by_issued_token(self_token).await?)
    }

    /// Our credentials object for an existing relationship, adapted to its version.
    pub fn credentials_for(&self, record: &CredentialsRecord) -> Result<Value, HandshakeError> {
        let token = record.self_token.as_deref().unwrap_or_default();
        self.shape_credentials(token, record.negotiated_version)
    }

    async fn run(
        &self,
        mode: Mode,
        counterpart_token: &str,
        counterpart_url: &str,
        requested: VersionNumber,
    ) -> Result<HandshakeOutcome, HandshakeError> {
        let existing = self.storage.get(counterpart_token).await?;
        let previous_token = match (mode, existing) {
            (Mode::Register, Some(_)) => return Err(HandshakeError::AlreadyRegistered),
            (Mode::Reregister, None) => return Err(HandshakeError::NotRegistered),
            (Mode::Register, None) => None,
            // No issued token yet: a registration is still in flight
            (Mode::Reregister, Some(record)) => match record.self_token {
                Some(token) => Some(token),
                None => return Err(HandshakeError::NotRegistered),
            },
        };

        let endpoints = self
            .negotiate(counterpart_token, counterpart_url, requested)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    counterpart = %redact(counterpart_token),
                    version = %requested,
                    "Handshake aborted: {e}"
                );
            })?;

        // Shape the response before writing anything
        let self_token = fresh_token(previous_token.as_deref());
        let credentials = self.shape_credentials(&self_token, requested)?;

        let stored = CounterpartCredentials::new(counterpart_token, endpoints);
        match mode {
            Mode::Register => self.storage.create(stored).await.map_err(|e| match e {
                StorageError::AlreadyExists => HandshakeError::AlreadyRegistered,
                other => HandshakeError::Storage(other),
            })?,
            Mode::Reregister => self.storage.update(stored).await.map_err(|e| match e {
                StorageError::NotFound => HandshakeError::NotRegistered,
                other => HandshakeError::Storage(other),
            })?,
        }

        let issued = self
            .storage
            .issue_token(
                counterpart_token,
                previous_token.as_deref(),
                self_token.clone(),
            )
            .await;
        if let Err(e) = issued {
            if matches!(mode, Mode::Register) {
                self.undo_create(counterpart_token).await;
            }
            return Err(match e {
                StorageError::Conflict | StorageError::NotFound => match mode {
                    Mode::Register => HandshakeError::AlreadyRegistered,
                    Mode::Reregister => HandshakeError::NotRegistered,
                },
                other => HandshakeError::Storage(other),
            });
        }

        tracing::info!(
            counterpart = %redact(counterpart_token),
            version = %requested,
            rotated = previous_token.is_some(),
            "Handshake complete"
        );

        Ok(HandshakeOutcome {
            self_token,
            version: requested,
            credentials,
        })
    }

    /// Drop a record created by this handshake whose token could not be issued.
    async fn undo_create(&self, counterpart_token: &str) {
        if let Err(e) = self.storage.remove(counterpart_token).await {
            tracing::error!(
                counterpart = %redact(counterpart_token),
                "Failed to roll back registration: {e}"
            );
        }
    }

    /// Fetch the catalog once, pick `requested`, fetch its endpoints.
    async fn negotiate(
        &self,
        token: &str,
        versions_url: &str,
        requested: VersionNumber,
    ) -> Result<EndpointSet, HandshakeError> {
        let catalog = self
            .bounded(self.client.fetch_versions(versions_url, token))
            .await?;

        let entry = catalog
            .select(requested)
            .ok_or(HandshakeError::UnsupportedVersion { requested })?;
        tracing::debug!(version = %requested, url = %entry.url, "Selected version");

        let details = self
            .bounded(self.client.fetch_endpoints(&entry.url, token))
            .await?;

        if let Some(advertised) = details.version.as_deref() {
            if advertised != requested.as_str() {
                return Err(ClientError::MalformedResponse(format!(
                    "details are for version {advertised}, expected {requested}"
                ))
                .into());
            }
        }

        EndpointSet::new(requested, details.endpoints)
            .map_err(|e| ClientError::MalformedResponse(e).into())
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, ClientError>>,
    ) -> Result<T, ClientError> {
        match self.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| ClientError::Timeout(limit))?,
            None => call.await,
        }
    }

    fn shape_credentials(
        &self,
        self_token: &str,
        version: VersionNumber,
    ) -> Result<Value, HandshakeError> {
        let data = json!({
            "token": self_token,
            "url": self.identity.versions_url,
            "roles": self.identity.roles,
        });
        Ok(self.adapter.adapt(ObjectKind::Credentials, &data, version)?)
    }
}

fn fresh_token(previous: Option<&str>) -> String {
    loop {
        let token = generate_token();
        if Some(token.as_str()) != previous {
            return token;
        }
    }
}
