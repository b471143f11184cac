//! Infrastructure layer: employee and credential persistence.
//!
//! Every backend implements the seams the HTTP layer depends on:
//! [`EmployeeStore`], plus `roster_auth::CredentialStore` and
//! `roster_auth::OwnershipLookup`.

pub mod credential_store;
pub mod employee_store;

pub use credential_store::InMemoryCredentialStore;
pub use employee_store::{EmployeeStore, InMemoryEmployeeStore, PostgresStore};
