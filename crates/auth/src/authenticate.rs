//! Credential → identity resolution.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use roster_core::{InfrastructureError, OwnerKey};

use crate::{AuthError, Credential, Identity, Role, parse_bearer};

/// A credential row as stored, before its role has been validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    pub role: String,
    pub owner_key: OwnerKey,
}

impl CredentialRecord {
    pub fn new(role: impl Into<String>, owner_key: impl Into<OwnerKey>) -> Self {
        Self {
            role: role.into(),
            owner_key: owner_key.into(),
        }
    }
}

/// Read access to the API-key table.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact match on the full token; `None` when no row has that key.
    async fn find_credential(
        &self,
        credential: &Credential,
    ) -> Result<Option<CredentialRecord>, InfrastructureError>;
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthenticateError {
    #[error(transparent)]
    Rejected(#[from] AuthError),

    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),
}

/// Resolve a raw `Authorization` header value to an [`Identity`].
///
/// Performs at most one store read. A stored role outside the known set
/// fails closed as [`AuthError::UnknownCredential`].
pub async fn authenticate(
    header: Option<&str>,
    store: &dyn CredentialStore,
) -> Result<Identity, AuthenticateError> {
    let credential = parse_bearer(header)?;

    let Some(record) = store.find_credential(&credential).await? else {
        debug!("credential not found in store");
        return Err(AuthError::UnknownCredential.into());
    };

    let role = match record.role.parse::<Role>() {
        Ok(role) => role,
        Err(e) => {
            warn!(owner = %record.owner_key, "rejecting credential: {e}");
            return Err(AuthError::UnknownCredential.into());
        }
    };

    Ok(Identity::new(credential, role, record.owner_key))
}
