//! Row generation counter for optimistic concurrency.

/// Version of a stored row.
///
/// Starts at [`RowVersion::INITIAL`] when a row is inserted and moves forward by
/// one on every successful replace. A write carrying an older version is stale.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowVersion(u64);

impl RowVersion {
    pub const INITIAL: RowVersion = RowVersion(1);

    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn matches(self, actual: RowVersion) -> bool {
        self == actual
    }
}

impl core::fmt::Display for RowVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "v{}", self.0)
    }
}
