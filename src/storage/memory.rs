//! In-process storage gateway.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tokio::sync::RwLock;

use super::{CounterpartCredentials, StorageError, StorageGateway};
use crate::credentials::CredentialsRecord;

#[derive(Default)]
struct Tables {
    /// Records by counterpart token
    records: HashMap<String, CredentialsRecord>,
    /// Issued token -> counterpart token
    issued: HashMap<String, String>,
}

/// `HashMap`-backed gateway guarded by a single `RwLock`.
///
/// Check-and-insert happens under the write lock, so concurrent `create`
/// calls for one token serialize. Cloning shares the underlying tables.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// Create empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored relationships
    pub async fn count(&self) -> usize {
        self.tables.read().await.records.len()
    }
}

impl StorageGateway for MemoryStorage {
    fn get<'a>(
        &'a self,
        counterpart_token: &'a str,
    ) -> BoxFuture<'a, Result<Option<CredentialsRecord>, StorageError>> {
        async move {
            let tables = self.tables.read().await;
            Ok(tables.records.get(counterpart_token).cloned())
        }
        .boxed()
    }

    fn find_by_issued_token<'a>(
        &'a self,
        self_token: &'a str,
    ) -> BoxFuture<'a, Result<Option<CredentialsRecord>, StorageError>> {
        async move {
            let tables = self.tables.read().await;
            Ok(tables
                .issued
                .get(self_token)
                .and_then(|counterpart| tables.records.get(counterpart))
                .cloned())
        }
        .boxed()
    }

    fn create(
        &self,
        credentials: CounterpartCredentials,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        async move {
            let mut tables = self.tables.write().await;
            if tables.records.contains_key(&credentials.token) {
                return Err(StorageError::AlreadyExists);
            }

            let record = CredentialsRecord {
                counterpart_token: credentials.token.clone(),
                self_token: None,
                negotiated_version: credentials.version(),
                endpoints: credentials.endpoints,
            };
            tables.records.insert(credentials.token, record);
            Ok(())
        }
        .boxed()
    }

    fn update(
        &self,
        credentials: CounterpartCredentials,
    ) -> BoxFuture<'_, Result<(), StorageError>> {
        async move {
            let mut tables = self.tables.write().await;
            let record = tables
                .records
                .get_mut(&credentials.token)
                .ok_or(StorageError::NotFound)?;

            record.negotiated_version = credentials.version();
            record.endpoints = credentials.endpoints;
            Ok(())
        }
        .boxed()
    }

    fn issue_token<'a>(
        &'a self,
        counterpart_token: &'a str,
        expected: Option<&'a str>,
        self_token: String,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut guard = self.tables.write().await;
            let tables = &mut *guard;
            let record = tables
                .records
                .get_mut(counterpart_token)
                .ok_or(StorageError::NotFound)?;

            if record.self_token.as_deref() != expected {
                return Err(StorageError::Conflict);
            }
            if let Some(previous) = record.self_token.replace(self_token.clone()) {
                tables.issued.remove(&previous);
            }
            tables
                .issued
                .insert(self_token, counterpart_token.to_string());
            Ok(())
        }
        .boxed()
    }

    fn remove<'a>(&'a self, counterpart_token: &'a str) -> BoxFuture<'a, Result<(), StorageError>> {
        async move {
            let mut tables = self.tables.write().await;
            let record = tables
                .records
                .remove(counterpart_token)
                .ok_or(StorageError::NotFound)?;
            if let Some(issued) = record.self_token {
                tables.issued.remove(&issued);
            }
            Ok(())
        }
        .boxed()
    }
}
