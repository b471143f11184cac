use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use roster_auth::OwnershipLookup;
use roster_core::{
    Employee, EmployeeChanges, EmployeeId, InfrastructureError, NewEmployee, OwnerKey,
};

use super::EmployeeStore;

type Rows = BTreeMap<EmployeeId, Employee>;

/// In-memory employee table.
///
/// Intended for tests/dev. Rows are kept in a `BTreeMap` so iteration order
/// is id order, matching what the Postgres store returns.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    rows: RwLock<Rows>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the table. A later row with the same id replaces an earlier one.
    pub fn with_employees(employees: impl IntoIterator<Item = Employee>) -> Self {
        let rows = employees
            .into_iter()
            .map(|e| (e.employee_id, e))
            .collect();
        Self {
            rows: RwLock::new(rows),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Rows>, InfrastructureError> {
        self.rows
            .read()
            .map_err(|_| InfrastructureError::query("employee table lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Rows>, InfrastructureError> {
        self.rows
            .write()
            .map_err(|_| InfrastructureError::query("employee table lock poisoned"))
    }
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn list(&self, limit: Option<i64>) -> Result<Vec<Employee>, InfrastructureError> {
        let rows = self.read()?;
        let take = match limit {
            Some(n) if n > 0 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => usize::MAX,
        };
        Ok(rows.values().take(take).cloned().collect())
    }

    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, InfrastructureError> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn list_by_manager(
        &self,
        manager: &OwnerKey,
    ) -> Result<Vec<Employee>, InfrastructureError> {
        let rows = self.read()?;
        Ok(rows
            .values()
            .filter(|e| e.is_managed_by(manager))
            .cloned()
            .collect())
    }

    async fn create(&self, new: NewEmployee) -> Result<EmployeeId, InfrastructureError> {
        // Max and insert under one write guard.
        let mut rows = self.write()?;
        let id = EmployeeId::after(rows.keys().next_back().copied())?;
        rows.insert(id, new.into_employee(id));
        Ok(id)
    }

    async fn update(
        &self,
        id: EmployeeId,
        changes: &EmployeeChanges,
    ) -> Result<bool, InfrastructureError> {
        let mut rows = self.write()?;
        match rows.get_mut(&id) {
            Some(employee) => {
                changes.apply_to(employee);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: EmployeeId) -> Result<bool, InfrastructureError> {
        Ok(self.write()?.remove(&id).is_some())
    }
}

#[async_trait]
impl OwnershipLookup for InMemoryEmployeeStore {
    async fn is_managed_by(
        &self,
        owner: &OwnerKey,
        employee_id: EmployeeId,
    ) -> Result<bool, InfrastructureError> {
        Ok(self
            .read()?
            .get(&employee_id)
            .is_some_and(|e| e.is_managed_by(owner)))
    }
}
