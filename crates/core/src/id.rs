//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{InfrastructureError, ValidationError};

/// Primary key of an employee record.
///
/// Always positive. New ids are assigned by the store, never by callers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(i64);

impl EmployeeId {
    /// First id handed out by an empty table.
    pub const FIRST: EmployeeId = EmployeeId(1);

    pub fn new(value: i64) -> Result<Self, ValidationError> {
        if value <= 0 {
            return Err(ValidationError::invalid_id(format!(
                "EmployeeId: must be positive, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Id following `current_max` (`max + 1`), or [`EmployeeId::FIRST`] for an empty table.
    ///
    /// Fails once the table already holds `i64::MAX`.
    pub fn after(current_max: Option<EmployeeId>) -> Result<EmployeeId, InfrastructureError> {
        match current_max {
            Some(EmployeeId(max)) => max
                .checked_add(1)
                .map(EmployeeId)
                .ok_or_else(|| InfrastructureError::query("employee id space exhausted")),
            None => Ok(Self::FIRST),
        }
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<i64> for EmployeeId {
    type Error = ValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmployeeId> for i64 {
    fn from(value: EmployeeId) -> Self {
        value.0
    }
}

impl FromStr for EmployeeId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s
            .parse::<i64>()
            .map_err(|e| ValidationError::invalid_id(format!("EmployeeId: {e}")))?;
        Self::new(value)
    }
}

/// Ownership key of a manager.
///
/// Stored on employee rows as `manager_id` and on manager credentials as the
/// owner name; ownership holds when the two are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerKey(String);

impl OwnerKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl core::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OwnerKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for OwnerKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}
