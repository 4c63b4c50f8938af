use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use staffroll_core::{EmployeeId, RowVersion};
use staffroll_employees::Employee;

/// Employee store operation error.
///
/// These are **infrastructure errors** (driver, decoding, availability). Absent
/// rows and stale writes are not errors: they are reported through `Option`
/// and [`ReplaceOutcome`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error in {operation}: {message}")]
    Database {
        operation: &'static str,
        message: String,
    },

    #[error("stored row {id} is corrupt: {reason}")]
    Corrupt { id: EmployeeId, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a full-record replace.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced,
    /// No row has the target id.
    NotFound,
    /// The row exists but changed since the version the write was based on.
    Conflict,
}

/// Persistent collection of employees keyed by a store-assigned id.
///
/// ## Implementation Requirements
///
/// Implementations must:
/// - assign ids that are positive, unique, and never reused (even after delete)
/// - ignore the incoming `id` on `create`
/// - bump the row version on every successful replace
/// - fail a replace whose expected version is stale with `ReplaceOutcome::Conflict`
/// - keep `ensure_schema` idempotent
#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Create the backing table if it does not exist yet.
    async fn ensure_schema(&self) -> Result<(), StoreError>;

    /// All rows, ordered by ascending id.
    async fn list(&self) -> Result<Vec<Employee>, StoreError>;

    /// Persist a new row and return it with its assigned id.
    async fn create(&self, employee: &Employee) -> Result<Employee, StoreError>;

    /// Point lookup returning the row together with its current version.
    async fn find_versioned(
        &self,
        id: EmployeeId,
    ) -> Result<Option<(Employee, RowVersion)>, StoreError>;

    /// Overwrite name, position and salary of row `id` if its version is still
    /// `expected`. The row keeps `id` whatever `employee.id` says.
    async fn replace_if_version(
        &self,
        id: EmployeeId,
        employee: &Employee,
        expected: RowVersion,
    ) -> Result<ReplaceOutcome, StoreError>;

    /// Remove row `id`, returning what was stored. `None` if there was no such row.
    async fn delete(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError>;

    async fn find(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        Ok(self.find_versioned(id).await?.map(|(employee, _)| employee))
    }

    /// Read the current version, then write against it.
    ///
    /// A writer or deleter that commits between the two steps turns this into
    /// `ReplaceOutcome::Conflict`.
    async fn replace(
        &self,
        id: EmployeeId,
        employee: &Employee,
    ) -> Result<ReplaceOutcome, StoreError> {
        match self.find_versioned(id).await? {
            None => Ok(ReplaceOutcome::NotFound),
            Some((_, version)) => self.replace_if_version(id, employee, version).await,
        }
    }

    async fn exists(&self, id: EmployeeId) -> Result<bool, StoreError> {
        Ok(self.find_versioned(id).await?.is_some())
    }
}

#[async_trait]
impl<S> EmployeeStore for Arc<S>
where
    S: EmployeeStore + ?Sized,
{
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        (**self).ensure_schema().await
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        (**self).list().await
    }

    async fn create(&self, employee: &Employee) -> Result<Employee, StoreError> {
        (**self).create(employee).await
    }

    async fn find_versioned(
        &self,
        id: EmployeeId,
    ) -> Result<Option<(Employee, RowVersion)>, StoreError> {
        (**self).find_versioned(id).await
    }

    async fn replace_if_version(
        &self,
        id: EmployeeId,
        employee: &Employee,
        expected: RowVersion,
    ) -> Result<ReplaceOutcome, StoreError> {
        (**self).replace_if_version(id, employee, expected).await
    }

    async fn delete(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        (**self).delete(id).await
    }

    async fn find(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        (**self).find(id).await
    }

    async fn replace(
        &self,
        id: EmployeeId,
        employee: &Employee,
    ) -> Result<ReplaceOutcome, StoreError> {
        (**self).replace(id, employee).await
    }

    async fn exists(&self, id: EmployeeId) -> Result<bool, StoreError> {
        (**self).exists(id).await
    }
}
