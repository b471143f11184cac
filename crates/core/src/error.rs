//! Domain error model.

use thiserror::Error;

/// Request payload or identifier failed validation.
///
/// Keep this focused on deterministic, caller-fixable failures. Storage
/// problems are [`InfrastructureError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more required fields were absent (or `null`).
    #[error("missing required field(s): {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// An update carried none of the updatable fields.
    #[error("nothing to update")]
    EmptyUpdate,

    /// The request body could not be decoded.
    #[error("invalid input: {0}")]
    InvalidBody(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl ValidationError {
    pub fn invalid_body(msg: impl Into<String>) -> Self {
        Self::InvalidBody(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

/// Failure of the persistence layer.
///
/// This is the only transient error class: clients may retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InfrastructureError {
    /// The backing store could not be reached.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The store was reachable but the operation failed.
    #[error("query failed: {0}")]
    Query(String),
}

impl InfrastructureError {
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::ConnectionFailed(msg.into())
    }

    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }
}
