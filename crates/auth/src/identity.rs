use roster_core::OwnerKey;

use crate::{Credential, Role};

/// Identity of an authenticated caller, resolved once per request.
///
/// Immutable once built; the HTTP layer carries it in request extensions and
/// drops it with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    credential: Credential,
    role: Role,
    owner_key: OwnerKey,
}

impl Identity {
    pub fn new(credential: Credential, role: Role, owner_key: OwnerKey) -> Self {
        Self {
            credential,
            role,
            owner_key,
        }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Only meaningful for managers.
    pub fn owner_key(&self) -> &OwnerKey {
        &self.owner_key
    }
}
