//! SQLite-backed employee store.
//!
//! Driver errors go through the shared `map_sqlx_error`. A row whose `salary`
//! text does not parse as a decimal maps to `Corrupt`.
//!
//! ## Optimistic Concurrency
//!
//! Every row carries a `version` column. `replace_if_version` updates with
//! `WHERE id = ? AND version = ?`; zero affected rows means the row is either
//! gone (`NotFound`) or was rewritten by someone else (`Conflict`).

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tracing::instrument;

use staffroll_core::{EmployeeId, RowVersion};
use staffroll_employees::Employee;

use super::r#trait::{EmployeeStore, ReplaceOutcome, StoreError};
use super::{column, map_sqlx_error, RowParts};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    name     TEXT    NOT NULL,
    position TEXT    NOT NULL,
    salary   TEXT    NOT NULL,
    version  INTEGER NOT NULL DEFAULT 1
)
"#;

/// SQLite-backed employee store.
///
/// `salary` is stored as its exact decimal text. `AUTOINCREMENT` keeps deleted
/// ids from being handed out again.
#[derive(Debug, Clone)]
pub struct SqliteEmployeeStore {
    pool: SqlitePool,
}

impl SqliteEmployeeStore {
    /// Wrap an existing connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url`, e.g. `sqlite://employees.db`.
    ///
    /// In-memory URLs ignore `max_connections` and go through [`Self::in_memory`].
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        if is_memory_url(url) {
            tracing::info!(url, "sqlite employee store is in-memory; pinning one connection");
            return Self::in_memory().await;
        }

        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("parse_url", e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        tracing::info!(url, max_connections, "sqlite employee store connected");
        Ok(Self::new(pool))
    }

    /// Private in-memory database.
    ///
    /// Every new connection to `:memory:` opens a fresh, empty database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    #[instrument(skip(self), err)]
    async fn create_table(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("create_table", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn select_all(&self) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, position, salary, version
            FROM employees
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("select_all", e))?;

        rows.iter()
            .map(|row| decode_row(row).map(|(employee, _)| employee))
            .collect()
    }

    #[instrument(skip(self, employee), err)]
    async fn insert_row(&self, employee: &Employee) -> Result<Employee, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees (name, position, salary, version)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.position)
        .bind(employee.salary.to_string())
        .bind(RowVersion::INITIAL.get() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_row", e))?;

        let id = EmployeeId::new(result.last_insert_rowid());
        tracing::debug!(%id, "employee created");
        Ok(employee.clone().with_id(id))
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn select_by_id(
        &self,
        id: EmployeeId,
    ) -> Result<Option<(Employee, RowVersion)>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, position, salary, version
            FROM employees
            WHERE id = ?1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("select_by_id", e))?;

        row.as_ref().map(decode_row).transpose()
    }

    #[instrument(skip(self, employee), fields(id = %id, expected = %expected), err)]
    async fn update_row(
        &self,
        id: EmployeeId,
        employee: &Employee,
        expected: RowVersion,
    ) -> Result<ReplaceOutcome, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE employees
            SET name = ?1, position = ?2, salary = ?3, version = version + 1
            WHERE id = ?4 AND version = ?5
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.position)
        .bind(employee.salary.to_string())
        .bind(id.get())
        .bind(expected.get() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_row", e))?;

        if result.rows_affected() == 1 {
            return Ok(ReplaceOutcome::Replaced);
        }

        let still_there = sqlx::query("SELECT 1 FROM employees WHERE id = ?1")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_row", e))?
            .is_some();

        if still_there {
            tracing::debug!("stale replace rejected");
            Ok(ReplaceOutcome::Conflict)
        } else {
            Ok(ReplaceOutcome::NotFound)
        }
    }

    #[instrument(skip(self), fields(id = %id), err)]
    async fn delete_row(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let row = sqlx::query(
            r#"
            DELETE FROM employees
            WHERE id = ?1
            RETURNING id, name, position, salary, version
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("delete_row", e))?;

        row.as_ref()
            .map(|row| decode_row(row).map(|(employee, _)| employee))
            .transpose()
    }
}

#[async_trait]
impl EmployeeStore for SqliteEmployeeStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.create_table().await
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        self.select_all().await
    }

    async fn create(&self, employee: &Employee) -> Result<Employee, StoreError> {
        self.insert_row(employee).await
    }

    async fn find_versioned(
        &self,
        id: EmployeeId,
    ) -> Result<Option<(Employee, RowVersion)>, StoreError> {
        self.select_by_id(id).await
    }

    async fn replace_if_version(
        &self,
        id: EmployeeId,
        employee: &Employee,
        expected: RowVersion,
    ) -> Result<ReplaceOutcome, StoreError> {
        self.update_row(id, employee, expected).await
    }

    async fn delete(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        self.delete_row(id).await
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn decode_row(row: &SqliteRow) -> Result<(Employee, RowVersion), StoreError> {
    let parts = RowParts::read(row)?;
    let salary_text: String = column(row, "salary")?;
    let salary = Decimal::from_str(&salary_text).map_err(|e| StoreError::Corrupt {
        id: parts.id,
        reason: format!("salary `{salary_text}` is not a decimal: {e}"),
    })?;
    parts.with_salary(salary)
}
