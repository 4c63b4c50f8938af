//! Employees domain module.
//!
//! This crate contains the employee record and its rules, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod employee;

pub use employee::Employee;
