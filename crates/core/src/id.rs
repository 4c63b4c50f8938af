//! Strongly-typed identifiers used across the domain.

use serde::{Deserialize, Serialize};

/// Identifier of an employee row.
///
/// Assigned by the store on creation. `0` means "not yet assigned"; every
/// persisted employee has a positive id. Path segments and JSON bodies both
/// decode it through serde, so anything that is not an integer is rejected
/// at the extractor.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(i64);

impl EmployeeId {
    /// The placeholder carried by records that were never stored.
    pub const UNASSIGNED: EmployeeId = EmployeeId(0);

    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn get(self) -> i64 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
