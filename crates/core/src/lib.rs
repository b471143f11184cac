//! `roster-core`: domain building blocks shared by every crate.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod employee;
pub mod error;
pub mod id;

pub use employee::{Employee, EmployeeChanges, NewEmployee};
pub use error::{InfrastructureError, ValidationError};
pub use id::{EmployeeId, OwnerKey};
