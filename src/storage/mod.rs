//! Persistence boundary for counterpart credentials.
//!
//! The handshake never owns records; it reads and writes them through a
//! [`StorageGateway`]. A gateway must make `create` an atomic
//! check-and-insert keyed by the counterpart token: two concurrent
//! registrations of the same token may both pass the initial lookup, but only
//! one `create` may succeed.
//!
//! Two distinct writes make up a handshake:
//!
//! | Write          | Method                 | Fact recorded                   |
//! |----------------|------------------------|---------------------------------|
//! | credentials    | `create` / `update`    | who the counterpart is          |
//! | registration   | `issue_token`          | which token we issued to them   |
//!
//! `issue_token` is a compare-and-swap on the previously issued token, so of
//! two concurrent re-registrations only one rotation lands. `remove` undoes a
//! `create` whose registration write failed.

mod memory;

pub use memory::MemoryStorage;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::credentials::CredentialsRecord;
use crate::versions::{EndpointSet, VersionNumber};

/// Storage failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A record for this counterpart token already exists.
    #[error("credentials already exist for counterpart")]
    AlreadyExists,

    /// No record for this counterpart token.
    #[error("no credentials for counterpart")]
    NotFound,

    /// The issued token changed since it was read.
    #[error("issued token changed concurrently")]
    Conflict,

    /// Backend failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// What the credentials write persists about a counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterpartCredentials {
    /// Token the counterpart issued to us
    pub token: String,
    /// Counterpart endpoints, bound to the negotiated version
    pub endpoints: EndpointSet,
}

impl CounterpartCredentials {
    /// Create from a token and the endpoints discovered for it
    pub fn new(token: impl Into<String>, endpoints: EndpointSet) -> Self {
        Self {
            token: token.into(),
            endpoints,
        }
    }

    /// Negotiated version
    pub fn version(&self) -> VersionNumber {
        self.endpoints.version()
    }
}

/// Get/create/update access to credentials records.
pub trait StorageGateway: Send + Sync {
    /// Look up a record by the token the counterpart issued to us.
    fn get<'a>(
        &'a self,
        counterpart_token: &'a str,
    ) -> BoxFuture<'a, Result<Option<CredentialsRecord>, StorageError>>;

    /// Look up a record by the token we issued to the counterpart.
    fn find_by_issued_token<'a>(
        &'a self,
        self_token: &'a str,
    ) -> BoxFuture<'a, Result<Option<CredentialsRecord>, StorageError>>;

    /// Insert a new record; `AlreadyExists` if the token is taken.
    ///
    /// Must be atomic with respect to other `create` calls for the same token.
    fn create(
        &self,
        credentials: CounterpartCredentials,
    ) -> BoxFuture<'_, Result<(), StorageError>>;

    /// Replace version and endpoints of an existing record; `NotFound` otherwise.
    fn update(
        &self,
        credentials: CounterpartCredentials,
    ) -> BoxFuture<'_, Result<(), StorageError>>;

    /// Record `self_token` as the token issued to this counterpart.
    ///
    /// `expected` is the issued token the caller last saw (`None` right after
    /// `create`); `Conflict` if the stored one differs.
    fn issue_token<'a>(
        &'a self,
        counterpart_token: &'a str,
        expected: Option<&'a str>,
        self_token: String,
    ) -> BoxFuture<'a, Result<(), StorageError>>;

    /// Delete a record and its issued token; `NotFound` if absent.
    fn remove<'a>(&'a self, counterpart_token: &'a str) -> BoxFuture<'a, Result<(), StorageError>>;
}
