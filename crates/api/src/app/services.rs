//! Service wiring: opens the configured employee store and maps the five
//! employee operations onto it.

use std::sync::Arc;

use thiserror::Error;

use staffroll_core::{DomainError, EmployeeId};
use staffroll_employees::Employee;
use staffroll_infra::employee_store::{
    EmployeeStore, InMemoryEmployeeStore, ReplaceOutcome, SqliteEmployeeStore, StoreError,
};
#[cfg(feature = "postgres")]
use staffroll_infra::employee_store::PostgresEmployeeStore;

use crate::config::{StoreBackend, StoreConfig};

/// Failure of an employee operation, before mapping to HTTP.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("employee {0} not found")]
    NotFound(EmployeeId),

    #[error(transparent)]
    Invalid(DomainError),

    /// The row changed under an update and still exists. Not retried.
    #[error("employee {0} was modified concurrently")]
    UnresolvedConflict(EmployeeId),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Shared handle passed to every handler.
#[derive(Clone)]
pub struct AppServices {
    store: Arc<dyn EmployeeStore>,
}

impl AppServices {
    pub fn new(store: Arc<dyn EmployeeStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Employee>, ServiceError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: EmployeeId) -> Result<Employee, ServiceError> {
        self.store
            .find(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn create(&self, employee: Employee) -> Result<Employee, ServiceError> {
        let created = self.store.create(&employee).await?;
        tracing::info!(id = %created.id, "employee created");
        Ok(created)
    }

    /// Full-record replace of `id`.
    ///
    /// A conflict is re-resolved once: if the row vanished in the meantime the
    /// caller sees `NotFound`, otherwise `UnresolvedConflict`.
    pub async fn update(&self, id: EmployeeId, employee: Employee) -> Result<(), ServiceError> {
        employee.ensure_id_matches(id).map_err(ServiceError::Invalid)?;

        match self.store.replace(id, &employee).await? {
            ReplaceOutcome::Replaced => {
                tracing::info!(%id, "employee updated");
                Ok(())
            }
            ReplaceOutcome::NotFound => Err(ServiceError::NotFound(id)),
            ReplaceOutcome::Conflict => {
                if self.store.exists(id).await? {
                    tracing::warn!(%id, "update lost an optimistic concurrency race");
                    Err(ServiceError::UnresolvedConflict(id))
                } else {
                    Err(ServiceError::NotFound(id))
                }
            }
        }
    }

    pub async fn delete(&self, id: EmployeeId) -> Result<(), ServiceError> {
        match self.store.delete(id).await? {
            Some(_) => {
                tracing::info!(%id, "employee deleted");
                Ok(())
            }
            None => Err(ServiceError::NotFound(id)),
        }
    }
}

/// Open the configured store and make sure its schema exists.
pub async fn build_services(config: &StoreConfig) -> Result<AppServices, StoreError> {
    let store: Arc<dyn EmployeeStore> = match config.backend {
        StoreBackend::InMemory => {
            tracing::warn!("using in-memory employee store; data is lost on exit");
            Arc::new(InMemoryEmployeeStore::new())
        }
        StoreBackend::Sqlite => Arc::new(
            SqliteEmployeeStore::connect(&config.database_url, config.max_connections).await?,
        ),
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => Arc::new(
            PostgresEmployeeStore::connect(&config.database_url, config.max_connections).await?,
        ),
    };

    store.ensure_schema().await?;
    tracing::info!(backend = ?config.backend, "employee store ready");

    Ok(AppServices::new(store))
}
