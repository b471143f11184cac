use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use roster_auth::{Credential, CredentialRecord, CredentialStore};
use roster_core::InfrastructureError;

/// In-memory API-key table, keyed by the full token.
///
/// Intended for tests/dev and for deployments configured from the
/// environment instead of a database.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    keys: RwLock<HashMap<String, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credentials(
        credentials: impl IntoIterator<Item = (String, CredentialRecord)>,
    ) -> Self {
        Self {
            keys: RwLock::new(credentials.into_iter().collect()),
        }
    }

    /// Add or replace the record for `token`.
    pub fn insert(
        &self,
        token: impl Into<String>,
        record: CredentialRecord,
    ) -> Result<(), InfrastructureError> {
        self.keys
            .write()
            .map_err(|_| InfrastructureError::query("credential table lock poisoned"))?
            .insert(token.into(), record);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_credential(
        &self,
        credential: &Credential,
    ) -> Result<Option<CredentialRecord>, InfrastructureError> {
        let keys = self
            .keys
            .read()
            .map_err(|_| InfrastructureError::query("credential table lock poisoned"))?;
        Ok(keys.get(credential.as_str()).cloned())
    }
}
