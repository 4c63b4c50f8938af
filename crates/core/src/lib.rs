//! `staffroll-core` — identifiers, versions and the domain error model.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;
pub mod version;

pub use error::{DomainError, DomainResult};
pub use id::EmployeeId;
pub use version::RowVersion;
