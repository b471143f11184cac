//! `roster-auth`: authentication and authorization decisions.
//!
//! No HTTP or storage code lives here; stores are reached through the
//! [`CredentialStore`] and [`OwnershipLookup`] seams.

pub mod authenticate;
pub mod authorize;
pub mod credential;
pub mod identity;
pub mod roles;

pub use authenticate::{AuthenticateError, CredentialRecord, CredentialStore, authenticate};
pub use authorize::{
    AccessDecision, AccessRequest, AuthzError, Evaluation, OwnershipLookup, Reason, ResourceKind,
    Verb, authorize, authorize_with, evaluate,
};
pub use credential::{AuthError, Credential, parse_bearer};
pub use identity::Identity;
pub use roles::{Role, UnknownRole};
