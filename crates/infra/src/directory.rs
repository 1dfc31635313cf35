//! In-memory employee directory for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use peopleforge_core::TenantId;
use peopleforge_employee::{DirectoryError, Employee, EmployeeDirectory, EmployeeId};

/// Tenant-partitioned in-memory directory.
#[derive(Debug, Default)]
pub struct InMemoryEmployeeDirectory {
    inner: RwLock<HashMap<(TenantId, EmployeeId), Employee>>,
}

impl InMemoryEmployeeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// All employees of one tenant (test/reporting helper).
    pub fn list(&self, tenant_id: TenantId) -> Vec<Employee> {
        match self.inner.read() {
            Ok(map) => map
                .iter()
                .filter_map(|((t, _), e)| (*t == tenant_id).then(|| e.clone()))
                .collect(),
            Err(_) => vec![],
        }
    }
}

impl EmployeeDirectory for InMemoryEmployeeDirectory {
    fn find_by_id(&self, tenant_id: TenantId, id: EmployeeId) -> Result<Employee, DirectoryError> {
        let map = self
            .inner
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;

        map.get(&(tenant_id, id))
            .cloned()
            .ok_or(DirectoryError::NotFound)
    }

    fn save(&self, tenant_id: TenantId, employee: Employee) -> Result<(), DirectoryError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;

        map.insert((tenant_id, employee.id()), employee);
        Ok(())
    }

    fn remove(&self, tenant_id: TenantId, id: EmployeeId) -> Result<(), DirectoryError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;

        // Idempotent by contract: missing records are a no-op.
        map.remove(&(tenant_id, id));
        Ok(())
    }

    fn count(&self, tenant_id: TenantId) -> Result<u64, DirectoryError> {
        let map = self
            .inner
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;

        Ok(map.keys().filter(|(t, _)| *t == tenant_id).count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use peopleforge_core::AggregateId;
    use peopleforge_employee::EmploymentType;

    fn employee(number: &str) -> Employee {
        Employee::hire(
            EmployeeId::new(AggregateId::new()),
            number,
            "Test Person",
            EmploymentType::Regular,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn save_and_find_are_tenant_scoped() {
        let directory = InMemoryEmployeeDirectory::new();
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let person = employee("A-0001");

        directory.save(tenant_a, person.clone()).unwrap();

        assert_eq!(directory.find_by_id(tenant_a, person.id()).unwrap(), person);
        assert_eq!(
            directory.find_by_id(tenant_b, person.id()).unwrap_err(),
            DirectoryError::NotFound
        );
        assert_eq!(directory.count(tenant_a).unwrap(), 1);
        assert_eq!(directory.count(tenant_b).unwrap(), 0);
    }

    #[test]
    fn remove_is_idempotent() {
        let directory = InMemoryEmployeeDirectory::new();
        let tenant = TenantId::new();
        let person = employee("A-0001");

        directory.save(tenant, person.clone()).unwrap();
        directory.remove(tenant, person.id()).unwrap();
        directory.remove(tenant, person.id()).unwrap();

        assert_eq!(directory.count(tenant).unwrap(), 0);
    }
}
