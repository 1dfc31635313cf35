//! In-memory employee history ledger for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use peopleforge_core::{DepartmentId, TenantId};
use peopleforge_employee::{
    Employee, EmployeeId, HistoryEntry, HistoryError, HistoryRecorder,
};

/// Tenant-partitioned, append-only history ledger.
///
/// Exposes reads for tests and reconciliation; there is deliberately no
/// update or delete surface.
#[derive(Debug, Default)]
pub struct InMemoryHistoryLedger {
    inner: RwLock<HashMap<TenantId, Vec<HistoryEntry>>>,
}

impl InMemoryHistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn append(&self, tenant_id: TenantId, entry: HistoryEntry) -> Result<(), HistoryError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| HistoryError::Unavailable("lock poisoned".to_string()))?;

        map.entry(tenant_id).or_default().push(entry);
        Ok(())
    }

    /// All entries for one employee in one tenant, in write order.
    pub fn entries(&self, tenant_id: TenantId, employee_id: EmployeeId) -> Vec<HistoryEntry> {
        match self.inner.read() {
            Ok(map) => map
                .get(&tenant_id)
                .map(|entries| {
                    entries
                        .iter()
                        .filter(|e| e.employee_id == employee_id)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            Err(_) => vec![],
        }
    }

    /// All entries for one tenant, in write order.
    pub fn all(&self, tenant_id: TenantId) -> Vec<HistoryEntry> {
        match self.inner.read() {
            Ok(map) => map.get(&tenant_id).cloned().unwrap_or_default(),
            Err(_) => vec![],
        }
    }
}

impl HistoryRecorder for InMemoryHistoryLedger {
    fn record_hire(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        reason: &str,
    ) -> Result<(), HistoryError> {
        self.append(tenant_id, HistoryEntry::hire(employee, reason))
    }

    fn record_resign(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        reason: &str,
    ) -> Result<(), HistoryError> {
        self.append(tenant_id, HistoryEntry::resign(employee, reason))
    }

    fn record_department_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<DepartmentId>,
        to: Option<DepartmentId>,
        reason: &str,
    ) -> Result<(), HistoryError> {
        self.append(
            tenant_id,
            HistoryEntry::department_change(employee, from, to, reason),
        )
    }

    fn record_position_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: &str,
    ) -> Result<(), HistoryError> {
        self.append(
            tenant_id,
            HistoryEntry::position_change(employee, from, to, reason),
        )
    }

    fn record_grade_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: &str,
    ) -> Result<(), HistoryError> {
        self.append(
            tenant_id,
            HistoryEntry::grade_change(employee, from, to, reason),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use peopleforge_core::AggregateId;
    use peopleforge_employee::{EmploymentType, HistoryChangeType};

    fn employee() -> Employee {
        Employee::hire(
            EmployeeId::new(AggregateId::new()),
            "EMP-0001",
            "Test Person",
            EmploymentType::Regular,
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn entries_accumulate_per_tenant_and_employee() {
        let ledger = InMemoryHistoryLedger::new();
        let tenant = TenantId::new();
        let person = employee();

        ledger.record_hire(tenant, &person, "initial hire").unwrap();
        ledger
            .record_position_change(
                tenant,
                &person,
                Some("TL".to_string()),
                Some("MGR".to_string()),
                "promotion",
            )
            .unwrap();

        let entries = ledger.entries(tenant, person.id());
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].change_type, HistoryChangeType::Hire);
        assert_eq!(entries[1].change_type, HistoryChangeType::PositionChange);
        assert_eq!(entries[1].to_position_code.as_deref(), Some("MGR"));

        // Another tenant sees nothing.
        assert!(ledger.entries(TenantId::new(), person.id()).is_empty());
    }
}
