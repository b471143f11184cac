use async_trait::async_trait;

use roster_core::{
    Employee, EmployeeChanges, EmployeeId, InfrastructureError, NewEmployee, OwnerKey,
};

/// Persistence seam for employee records.
///
/// Implementations must be `Send + Sync`; the HTTP layer shares one instance
/// across all requests behind an `Arc<dyn EmployeeStore>`.
///
/// ## Id assignment
///
/// `create` assigns `max(employee_id) + 1` (or `1` on an empty table). The
/// read of the maximum and the insert are serialised per store, so concurrent
/// creates never observe the same maximum.
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// All employees ordered by id; `limit` caps the row count when present.
    async fn list(&self, limit: Option<i64>) -> Result<Vec<Employee>, InfrastructureError>;

    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, InfrastructureError>;

    /// Employees whose `manager_id` equals `manager`, ordered by id.
    async fn list_by_manager(&self, manager: &OwnerKey)
    -> Result<Vec<Employee>, InfrastructureError>;

    async fn create(&self, new: NewEmployee) -> Result<EmployeeId, InfrastructureError>;

    /// Returns `false` when no row has `id`.
    async fn update(
        &self,
        id: EmployeeId,
        changes: &EmployeeChanges,
    ) -> Result<bool, InfrastructureError>;

    /// Returns `false` when no row has `id`.
    async fn delete(&self, id: EmployeeId) -> Result<bool, InfrastructureError>;
}
