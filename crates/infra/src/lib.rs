//! Infrastructure layer: employee persistence (SQLite, Postgres, in-memory).

pub mod employee_store;


pub use employee_store::{
    EmployeeStore, InMemoryEmployeeStore, ReplaceOutcome, SqliteEmployeeStore, StoreError,
};
#[cfg(feature = "postgres")]
pub use employee_store::PostgresEmployeeStore;
