//! Postgres-backed employee store (`postgres` feature).
//!
//! Same contract as the SQLite store. `salary` is a `NUMERIC` column decoded
//! straight into `rust_decimal::Decimal`; ids come from an identity column, so
//! deleted ids are never handed out again.

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use tracing::instrument;

use staffroll_core::{EmployeeId, RowVersion};
use staffroll_employees::Employee;

use super::r#trait::{EmployeeStore, ReplaceOutcome, StoreError};
use super::{column, map_sqlx_error, RowParts};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS employees (
    id       BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
    name     TEXT    NOT NULL,
    position TEXT    NOT NULL,
    salary   NUMERIC NOT NULL,
    version  BIGINT  NOT NULL DEFAULT 1
)
"#;

/// Postgres-backed employee store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool, which is `Send + Sync` and cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresEmployeeStore {
    pool: PgPool,
}

impl PostgresEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;

        tracing::info!(max_connections, "postgres employee store connected");
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
        let row = sqlx::query(
            r#"
            INSERT INTO employees (name, position, salary, version)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.position)
        .bind(employee.salary)
        .bind(RowVersion::INITIAL.get() as i64)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_row", e))?;

        let id = EmployeeId::new(column(&row, "id")?);
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
            WHERE id = $1
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
            SET name = $1, position = $2, salary = $3, version = version + 1
            WHERE id = $4 AND version = $5
            "#,
        )
        .bind(&employee.name)
        .bind(&employee.position)
        .bind(employee.salary)
        .bind(id.get())
        .bind(expected.get() as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_row", e))?;

        if result.rows_affected() == 1 {
            return Ok(ReplaceOutcome::Replaced);
        }

        let still_there = sqlx::query("SELECT 1 FROM employees WHERE id = $1")
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
            WHERE id = $1
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
impl EmployeeStore for PostgresEmployeeStore {
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

fn decode_row(row: &PgRow) -> Result<(Employee, RowVersion), StoreError> {
    let parts = RowParts::read(row)?;
    let salary: Decimal = column(row, "salary")?;
    parts.with_salary(salary)
}
