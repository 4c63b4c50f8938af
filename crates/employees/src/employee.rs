use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use staffroll_core::{DomainError, DomainResult, EmployeeId};

/// An employee record.
///
/// `id` is assigned by the store on creation; request bodies may omit it (or
/// send `0`) when the record has not been stored yet. `salary` travels as a
/// JSON number whose digits are kept verbatim, never rounded through `f64`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: EmployeeId,
    pub name: String,
    pub position: String,
    #[serde(with = "rust_decimal::serde::arbitrary_precision")]
    pub salary: Decimal,
}

impl Employee {
    /// Create a record that has not been stored yet.
    pub fn new(name: impl Into<String>, position: impl Into<String>, salary: Decimal) -> Self {
        Self {
            id: EmployeeId::UNASSIGNED,
            name: name.into(),
            position: position.into(),
            salary,
        }
    }

    /// Same record, carrying `id`.
    pub fn with_id(mut self, id: EmployeeId) -> Self {
        self.id = id;
        self
    }

    /// Full-record replacement targets exactly one row: the body must name the
    /// same id as the path.
    pub fn ensure_id_matches(&self, target: EmployeeId) -> DomainResult<()> {
        if self.id == target {
            Ok(())
        } else {
            Err(DomainError::validation(format!(
                "body id {} does not match target id {}",
                self.id, target
            )))
        }
    }

    /// True when all non-identity fields equal `other`'s.
    pub fn same_fields(&self, other: &Employee) -> bool {
        self.name == other.name && self.position == other.position && self.salary == other.salary
    }
}
