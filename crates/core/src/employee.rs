//! Employee records and the validated payloads that create or change them.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::{EmployeeId, OwnerKey};

/// A row of the employees table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: EmployeeId,
    pub name: String,
    pub email: String,
    pub manager_id: Option<OwnerKey>,
}

impl Employee {
    /// Whether this employee belongs to the manager holding `owner`.
    pub fn is_managed_by(&self, owner: &OwnerKey) -> bool {
        self.manager_id.as_ref() == Some(owner)
    }
}

/// Payload for creating an employee. Every field is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEmployee {
    pub name: String,
    pub email: String,
    pub manager_id: OwnerKey,
}

impl NewEmployee {
    /// Build from optional request fields, reporting every missing one at once.
    ///
    /// Only presence is checked; an empty string is a present value.
    pub fn from_fields(
        name: Option<String>,
        email: Option<String>,
        manager_id: Option<OwnerKey>,
    ) -> Result<Self, ValidationError> {
        match (name, email, manager_id) {
            (Some(name), Some(email), Some(manager_id)) => Ok(Self {
                name,
                email,
                manager_id,
            }),
            (name, email, manager_id) => {
                let mut missing = Vec::new();
                if name.is_none() {
                    missing.push("name");
                }
                if email.is_none() {
                    missing.push("email");
                }
                if manager_id.is_none() {
                    missing.push("managerId");
                }
                Err(ValidationError::MissingFields(missing))
            }
        }
    }

    pub fn into_employee(self, employee_id: EmployeeId) -> Employee {
        Employee {
            employee_id,
            name: self.name,
            email: self.email,
            manager_id: Some(self.manager_id),
        }
    }
}

/// Partial update of an employee. At least one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EmployeeChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub manager_id: Option<OwnerKey>,
}

impl EmployeeChanges {
    pub fn new(
        name: Option<String>,
        email: Option<String>,
        manager_id: Option<OwnerKey>,
    ) -> Result<Self, ValidationError> {
        let changes = Self {
            name,
            email,
            manager_id,
        };
        if changes.is_empty() {
            return Err(ValidationError::EmptyUpdate);
        }
        Ok(changes)
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.manager_id.is_none()
    }

    pub fn apply_to(&self, employee: &mut Employee) {
        if let Some(name) = &self.name {
            employee.name = name.clone();
        }
        if let Some(email) = &self.email {
            employee.email = email.clone();
        }
        if let Some(manager_id) = &self.manager_id {
            employee.manager_id = Some(manager_id.clone());
        }
    }
}
