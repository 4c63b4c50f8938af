//! Employee persistence boundary.
//!
//! This module defines an infrastructure-facing abstraction for storing and
//! loading employee rows without making any storage assumptions.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod sqlite;
pub mod r#trait;

pub use in_memory::InMemoryEmployeeStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresEmployeeStore;
pub use r#trait::{EmployeeStore, ReplaceOutcome, StoreError};
pub use sqlite::SqliteEmployeeStore;

use rust_decimal::Decimal;
use sqlx::Row;

use staffroll_core::{EmployeeId, RowVersion};
use staffroll_employees::Employee;

/// Map a driver error from `operation` onto the store error model.
///
/// | SQLx Error | StoreError |
/// |------------|------------|
/// | PoolClosed / PoolTimedOut | `Unavailable` |
/// | anything else | `Database` (with the failing operation) |
fn map_sqlx_error(operation: &'static str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {operation}"))
        }
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool timed out in {operation}"))
        }
        sqlx::Error::Database(db_err) => StoreError::Database {
            operation,
            message: db_err.message().to_string(),
        },
        other => StoreError::Database {
            operation,
            message: other.to_string(),
        },
    }
}

fn column<'r, R, T>(row: &'r R, name: &'static str) -> Result<T, StoreError>
where
    R: Row,
    &'static str: sqlx::ColumnIndex<R>,
    T: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
{
    row.try_get(name).map_err(|e| map_sqlx_error("decode_row", e))
}

/// Columns shared by every SQL backend, read from one `employees` row.
/// `salary` is left to the caller since its column type differs per engine.
struct RowParts {
    id: EmployeeId,
    name: String,
    position: String,
    version: i64,
}

impl RowParts {
    fn read<R>(row: &R) -> Result<Self, StoreError>
    where
        R: Row,
        &'static str: sqlx::ColumnIndex<R>,
        for<'r> i64: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
        for<'r> String: sqlx::Decode<'r, R::Database> + sqlx::Type<R::Database>,
    {
        Ok(Self {
            id: EmployeeId::new(column(row, "id")?),
            name: column(row, "name")?,
            position: column(row, "position")?,
            version: column(row, "version")?,
        })
    }

    fn with_salary(self, salary: Decimal) -> Result<(Employee, RowVersion), StoreError> {
        let version = u64::try_from(self.version).map_err(|_| StoreError::Corrupt {
            id: self.id,
            reason: format!("negative version {}", self.version),
        })?;

        Ok((
            Employee {
                id: self.id,
                name: self.name,
                position: self.position,
                salary,
            },
            RowVersion::new(version),
        ))
    }
}
