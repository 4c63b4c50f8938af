use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use staffroll_core::{EmployeeId, RowVersion};
use staffroll_employees::Employee;

use super::r#trait::{EmployeeStore, ReplaceOutcome, StoreError};

#[derive(Debug, Clone)]
struct StoredRow {
    employee: Employee,
    version: RowVersion,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<EmployeeId, StoredRow>,
    /// Highest id ever handed out; deleted ids are not reused.
    last_id: i64,
}

/// In-memory employee store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeStore {
    table: RwLock<Table>,
}

impl InMemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("lock poisoned".to_string())
    }
}

#[async_trait]
impl EmployeeStore for InMemoryEmployeeStore {
    async fn ensure_schema(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Employee>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table.rows.values().map(|row| row.employee.clone()).collect())
    }

    async fn create(&self, employee: &Employee) -> Result<Employee, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;

        table.last_id += 1;
        let id = EmployeeId::new(table.last_id);
        let stored = employee.clone().with_id(id);
        table.rows.insert(
            id,
            StoredRow {
                employee: stored.clone(),
                version: RowVersion::INITIAL,
            },
        );

        tracing::debug!(%id, "employee created");
        Ok(stored)
    }

    async fn find_versioned(
        &self,
        id: EmployeeId,
    ) -> Result<Option<(Employee, RowVersion)>, StoreError> {
        let table = self.table.read().map_err(|_| Self::poisoned())?;
        Ok(table
            .rows
            .get(&id)
            .map(|row| (row.employee.clone(), row.version)))
    }

    async fn replace_if_version(
        &self,
        id: EmployeeId,
        employee: &Employee,
        expected: RowVersion,
    ) -> Result<ReplaceOutcome, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;

        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(ReplaceOutcome::NotFound);
        };
        if !expected.matches(row.version) {
            tracing::debug!(%id, %expected, actual = %row.version, "stale replace rejected");
            return Ok(ReplaceOutcome::Conflict);
        }

        row.employee = employee.clone().with_id(id);
        row.version = row.version.next();
        Ok(ReplaceOutcome::Replaced)
    }

    async fn delete(&self, id: EmployeeId) -> Result<Option<Employee>, StoreError> {
        let mut table = self.table.write().map_err(|_| Self::poisoned())?;
        Ok(table.rows.remove(&id).map(|row| row.employee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn employee(name: &str, position: &str, salary: i64) -> Employee {
        Employee::new(name, position, Decimal::new(salary, 0))
    }

    #[tokio::test]
    async fn create_assigns_increasing_ids_and_ignores_incoming_id() {
        let store = InMemoryEmployeeStore::new();

        let first = store
            .create(&employee("John", "Dev", 50000).with_id(EmployeeId::new(99)))
            .await
            .unwrap();
        let second = store.create(&employee("Jane", "Manager", 75000)).await.unwrap();

        assert_eq!(first.id, EmployeeId::new(1));
        assert_eq!(second.id, EmployeeId::new(2));
        assert!(store.find(EmployeeId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn replace_bumps_version_and_rejects_stale_writes() {
        let store = InMemoryEmployeeStore::new();
        let created = store.create(&employee("John", "Dev", 50000)).await.unwrap();

        let (_, v1) = store.find_versioned(created.id).await.unwrap().unwrap();
        assert_eq!(v1, RowVersion::INITIAL);

        let promoted = employee("John", "Lead", 60000).with_id(created.id);
        assert_eq!(
            store.replace_if_version(created.id, &promoted, v1).await.unwrap(),
            ReplaceOutcome::Replaced
        );

        // A second writer still holding v1 loses.
        let other = employee("John", "Intern", 1).with_id(created.id);
        assert_eq!(
            store.replace_if_version(created.id, &other, v1).await.unwrap(),
            ReplaceOutcome::Conflict
        );

        let (current, v2) = store.find_versioned(created.id).await.unwrap().unwrap();
        assert_eq!(current, promoted);
        assert_eq!(v2, v1.next());
    }

    #[tokio::test]
    async fn replace_keeps_target_id_even_if_body_differs() {
        let store = InMemoryEmployeeStore::new();
        let created = store.create(&employee("John", "Dev", 50000)).await.unwrap();

        let body = employee("John", "Dev", 51000).with_id(EmployeeId::new(77));
        assert_eq!(
            store.replace(created.id, &body).await.unwrap(),
            ReplaceOutcome::Replaced
        );
        let stored = store.find(created.id).await.unwrap().unwrap();
        assert_eq!(stored.id, created.id);
        assert_eq!(stored.salary, Decimal::new(51000, 0));
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let store = InMemoryEmployeeStore::new();
        let first = store.create(&employee("John", "Dev", 50000)).await.unwrap();
        assert!(store.delete(first.id).await.unwrap().is_some());

        let next = store.create(&employee("Jane", "Manager", 75000)).await.unwrap();
        assert!(next.id > first.id);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn runtime() -> tokio::runtime::Runtime {
            tokio::runtime::Builder::new_current_thread()
                .build()
                .expect("runtime")
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: a freshly created record reads back unchanged.
            #[test]
            fn create_then_find_round_trips(
                name in "[A-Za-z][A-Za-z ]{0,40}",
                position in "[A-Za-z][A-Za-z ]{0,40}",
                cents in 0i64..10_000_000_00,
            ) {
                let store = InMemoryEmployeeStore::new();
                let input = Employee::new(name, position, Decimal::new(cents, 2));

                let (created, fetched) = runtime().block_on(async {
                    let created = store.create(&input).await.unwrap();
                    let fetched = store.find(created.id).await.unwrap();
                    (created, fetched)
                });

                prop_assert!(created.id.is_assigned());
                prop_assert!(created.same_fields(&input));
                prop_assert_eq!(fetched, Some(created));
            }
        }
    }
}
