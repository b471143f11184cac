use serde::{Deserialize, Serialize};

use roster_core::{Employee, EmployeeChanges, EmployeeId, NewEmployee, OwnerKey, ValidationError};

// -------------------------
// Request DTOs
// -------------------------

/// Manager reference as sent by clients: `"M1"` or `5`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ManagerRef {
    Key(String),
    Number(i64),
}

impl From<ManagerRef> for OwnerKey {
    fn from(value: ManagerRef) -> Self {
        match value {
            ManagerRef::Key(key) => OwnerKey::new(key),
            ManagerRef::Number(n) => OwnerKey::new(n.to_string()),
        }
    }
}

/// Body of `POST /employees` and `PUT /employees/{id}`.
///
/// Every field is optional at the wire level; [`Self::into_new_employee`]
/// and [`Self::into_changes`] apply the per-verb rules. `null` is absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeBody {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(alias = "manager_id")]
    pub manager_id: Option<ManagerRef>,
}

impl EmployeeBody {
    /// Decode a raw request body. Anything that is not a JSON object of the
    /// expected shape is [`ValidationError::InvalidBody`].
    pub fn parse(bytes: &[u8]) -> Result<Self, ValidationError> {
        serde_json::from_slice(bytes).map_err(|e| ValidationError::invalid_body(e.to_string()))
    }

    pub fn into_new_employee(self) -> Result<NewEmployee, ValidationError> {
        NewEmployee::from_fields(self.name, self.email, self.manager_id.map(OwnerKey::from))
    }

    pub fn into_changes(self) -> Result<EmployeeChanges, ValidationError> {
        EmployeeChanges::new(self.name, self.email, self.manager_id.map(OwnerKey::from))
    }
}

/// `?limit=N` on the employee listing.
///
/// Only a positive integer limits the result; anything else means "all".
pub fn parse_limit(raw: Option<&str>) -> Option<i64> {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
}

// -------------------------
// Response DTOs
// -------------------------

/// Public projection of an employee row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    pub employee_id: EmployeeId,
    pub name: String,
    pub email: String,
}

impl From<Employee> for EmployeeView {
    fn from(e: Employee) -> Self {
        Self {
            employee_id: e.employee_id,
            name: e.name,
            email: e.email,
        }
    }
}

pub fn employee_views(rows: Vec<Employee>) -> Vec<EmployeeView> {
    rows.into_iter().map(EmployeeView::from).collect()
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedResponse {
    pub message: &'static str,
    pub employee_id: EmployeeId,
}
