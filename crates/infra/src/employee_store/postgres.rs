//! Postgres-backed store.
//!
//! One pool serves all three seams the HTTP layer needs: employee rows
//! ([`EmployeeStore`]), API keys ([`CredentialStore`]) and the manager
//! ownership check ([`OwnershipLookup`]).
//!
//! ## Expected schema
//!
//! ```sql
//! CREATE TABLE employees (
//!     employee_id BIGINT PRIMARY KEY,
//!     name        TEXT NOT NULL,
//!     email       TEXT NOT NULL,
//!     manager_id  TEXT NULL
//! );
//! CREATE TABLE api_keys (
//!     api_key    TEXT PRIMARY KEY,
//!     role       TEXT NOT NULL,
//!     owner_name TEXT NOT NULL
//! );
//! ```
//!
//! Tables are not created here.
//!
//! ## Error mapping
//!
//! | SQLx error | `InfrastructureError` |
//! |------------|-----------------------|
//! | `Io`, `Tls`, `Pool*`, `WorkerCrashed`, `Configuration` | `ConnectionFailed` |
//! | anything else | `Query` |

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use roster_auth::{Credential, CredentialRecord, CredentialStore, OwnershipLookup};
use roster_core::{
    Employee, EmployeeChanges, EmployeeId, InfrastructureError, NewEmployee, OwnerKey,
};

use super::EmployeeStore;

/// Key for the transaction-scoped advisory lock that serialises id assignment.
const CREATE_LOCK_KEY: i64 = 0x0e_4d_70_1d;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Build a store whose pool connects on first use.
    ///
    /// Only the URL is validated here; an unreachable server surfaces later
    /// as [`InfrastructureError::ConnectionFailed`] on the first query.
    pub fn connect_lazy(database_url: &str) -> Result<Self, InfrastructureError> {
        let pool = PgPoolOptions::new()
            .connect_lazy(database_url)
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl EmployeeStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list(&self, limit: Option<i64>) -> Result<Vec<Employee>, InfrastructureError> {
        let rows = match limit {
            Some(n) if n > 0 => {
                sqlx::query(
                    "SELECT employee_id, name, email, manager_id FROM employees \
                     ORDER BY employee_id LIMIT $1",
                )
                .bind(n)
                .fetch_all(&*self.pool)
                .await
            }
            _ => {
                sqlx::query(
                    "SELECT employee_id, name, email, manager_id FROM employees \
                     ORDER BY employee_id",
                )
                .fetch_all(&*self.pool)
                .await
            }
        }
        .map_err(|e| map_sqlx_error("list", e))?;

        rows.iter().map(employee_from_row).collect()
    }

    #[instrument(skip(self), fields(employee_id = %id), err)]
    async fn get(&self, id: EmployeeId) -> Result<Option<Employee>, InfrastructureError> {
        let row = sqlx::query(
            "SELECT employee_id, name, email, manager_id FROM employees WHERE employee_id = $1",
        )
        .bind(id.get())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get", e))?;

        row.as_ref().map(employee_from_row).transpose()
    }

    #[instrument(skip(self), fields(manager = %manager), err)]
    async fn list_by_manager(
        &self,
        manager: &OwnerKey,
    ) -> Result<Vec<Employee>, InfrastructureError> {
        let rows = sqlx::query(
            r#"
            SELECT employee_id, name, email, manager_id
            FROM employees
            WHERE manager_id = $1
            ORDER BY employee_id
            "#,
        )
        .bind(manager.as_str())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_by_manager", e))?;

        rows.iter().map(employee_from_row).collect()
    }

    /// `max + 1` inside a transaction holding an advisory lock, so two
    /// concurrent creates cannot read the same maximum.
    #[instrument(skip(self, new), fields(employee_id = tracing::field::Empty), err)]
    async fn create(&self, new: NewEmployee) -> Result<EmployeeId, InfrastructureError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(CREATE_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("advisory_lock", e))?;

        let current_max: Option<i64> =
            sqlx::query("SELECT MAX(employee_id) AS max_id FROM employees")
                .fetch_one(&mut *tx)
                .await
                .and_then(|row| row.try_get("max_id"))
                .map_err(|e| map_sqlx_error("max_employee_id", e))?;

        let current_max = current_max.map(EmployeeId::new).transpose().map_err(|e| {
            InfrastructureError::query(format!("stored employee_id out of range: {e}"))
        })?;
        let id = EmployeeId::after(current_max)?;

        sqlx::query(
            "INSERT INTO employees (employee_id, name, email, manager_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(id.get())
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.manager_id.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_employee", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit", e))?;

        tracing::Span::current().record("employee_id", id.get());
        Ok(id)
    }

    #[instrument(skip(self, changes), fields(employee_id = %id), err)]
    async fn update(
        &self,
        id: EmployeeId,
        changes: &EmployeeChanges,
    ) -> Result<bool, InfrastructureError> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                manager_id = COALESCE($4, manager_id)
            WHERE employee_id = $1
            "#,
        )
        .bind(id.get())
        .bind(changes.name.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.manager_id.as_ref().map(OwnerKey::as_str))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update", e))?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(employee_id = %id), err)]
    async fn delete(&self, id: EmployeeId) -> Result<bool, InfrastructureError> {
        let result = sqlx::query("DELETE FROM employees WHERE employee_id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete", e))?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CredentialStore for PostgresStore {
    // The token is never recorded on the span.
    #[instrument(skip(self, credential), err)]
    async fn find_credential(
        &self,
        credential: &Credential,
    ) -> Result<Option<CredentialRecord>, InfrastructureError> {
        let row = sqlx::query("SELECT role, owner_name FROM api_keys WHERE api_key = $1")
            .bind(credential.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_credential", e))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let decode = |e| map_sqlx_error("decode_api_key", e);
        let role: String = row.try_get("role").map_err(decode)?;
        let owner: String = row.try_get("owner_name").map_err(decode)?;
        Ok(Some(CredentialRecord::new(role, owner)))
    }
}

#[async_trait]
impl OwnershipLookup for PostgresStore {
    #[instrument(skip(self), fields(owner = %owner, employee_id = %employee_id), err)]
    async fn is_managed_by(
        &self,
        owner: &OwnerKey,
        employee_id: EmployeeId,
    ) -> Result<bool, InfrastructureError> {
        let row = sqlx::query("SELECT 1 FROM employees WHERE employee_id = $1 AND manager_id = $2")
            .bind(employee_id.get())
            .bind(owner.as_str())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("is_managed_by", e))?;

        Ok(row.is_some())
    }
}

fn employee_from_row(row: &PgRow) -> Result<Employee, InfrastructureError> {
    let decode = |e| map_sqlx_error("decode_employee", e);

    let raw_id: i64 = row.try_get("employee_id").map_err(decode)?;
    let manager_id: Option<String> = row.try_get("manager_id").map_err(decode)?;

    Ok(Employee {
        employee_id: EmployeeId::new(raw_id)
            .map_err(|e| InfrastructureError::query(format!("stored employee_id invalid: {e}")))?,
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        manager_id: manager_id.map(OwnerKey::new),
    })
}

/// Map a sqlx error to the domain's infrastructure error.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> InfrastructureError {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Configuration(_) => {
            InfrastructureError::connection(format!("{operation}: {err}"))
        }
        sqlx::Error::Database(db_err) => {
            InfrastructureError::query(format!(
                "database error in {operation}: {}",
                db_err.message()
            ))
        }
        other => InfrastructureError::query(format!("sqlx error in {operation}: {other}")),
    }
}
