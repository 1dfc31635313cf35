//! Append-only ledger of an employee's organizational events.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use peopleforge_core::{DepartmentId, TenantId};

use crate::employee::{Employee, EmployeeId};

/// Kind of organizational change a history entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryChangeType {
    Hire,
    Resign,
    /// Department move (including inter-company transfers).
    Transfer,
    PositionChange,
    GradeChange,
}

/// An immutable audit fact about one employee's organizational state change.
///
/// Entries are never updated or deleted once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub employee_id: EmployeeId,
    pub change_type: HistoryChangeType,
    pub from_department_id: Option<DepartmentId>,
    pub to_department_id: Option<DepartmentId>,
    pub from_position_code: Option<String>,
    pub to_position_code: Option<String>,
    pub from_grade_code: Option<String>,
    pub to_grade_code: Option<String>,
    pub effective_date: NaiveDate,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn hire(employee: &Employee, reason: impl Into<String>) -> Self {
        Self {
            employee_id: employee.id(),
            change_type: HistoryChangeType::Hire,
            from_department_id: None,
            to_department_id: employee.department_id(),
            from_position_code: None,
            to_position_code: employee.position_code().map(str::to_owned),
            from_grade_code: None,
            to_grade_code: employee.job_title_code().map(str::to_owned),
            effective_date: employee.hire_date(),
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn resign(employee: &Employee, reason: impl Into<String>) -> Self {
        Self {
            employee_id: employee.id(),
            change_type: HistoryChangeType::Resign,
            from_department_id: employee.department_id(),
            to_department_id: None,
            from_position_code: employee.position_code().map(str::to_owned),
            to_position_code: None,
            from_grade_code: employee.job_title_code().map(str::to_owned),
            to_grade_code: None,
            effective_date: employee
                .resign_date()
                .unwrap_or_else(|| Utc::now().date_naive()),
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn department_change(
        employee: &Employee,
        from: Option<DepartmentId>,
        to: Option<DepartmentId>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee.id(),
            change_type: HistoryChangeType::Transfer,
            from_department_id: from,
            to_department_id: to,
            from_position_code: None,
            to_position_code: None,
            from_grade_code: None,
            to_grade_code: None,
            effective_date: Utc::now().date_naive(),
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn position_change(
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee.id(),
            change_type: HistoryChangeType::PositionChange,
            from_department_id: None,
            to_department_id: None,
            from_position_code: from,
            to_position_code: to,
            from_grade_code: None,
            to_grade_code: None,
            effective_date: Utc::now().date_naive(),
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }

    pub fn grade_change(
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee.id(),
            change_type: HistoryChangeType::GradeChange,
            from_department_id: None,
            to_department_id: None,
            from_position_code: None,
            to_position_code: None,
            from_grade_code: from,
            to_grade_code: to,
            effective_date: Utc::now().date_naive(),
            reason: reason.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// History write error. Writes either fully succeed or fail; there are no
/// partial writes to report.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HistoryError {
    #[error("history ledger unavailable: {0}")]
    Unavailable(String),
}

/// One write operation per change type, always succeeding-or-failing whole.
pub trait HistoryRecorder: Send + Sync {
    fn record_hire(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        reason: &str,
    ) -> Result<(), HistoryError>;

    fn record_resign(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        reason: &str,
    ) -> Result<(), HistoryError>;

    fn record_department_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<DepartmentId>,
        to: Option<DepartmentId>,
        reason: &str,
    ) -> Result<(), HistoryError>;

    fn record_position_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: &str,
    ) -> Result<(), HistoryError>;

    fn record_grade_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: &str,
    ) -> Result<(), HistoryError>;
}

impl<H> HistoryRecorder for Arc<H>
where
    H: HistoryRecorder + ?Sized,
{
    fn record_hire(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        reason: &str,
    ) -> Result<(), HistoryError> {
        (**self).record_hire(tenant_id, employee, reason)
    }

    fn record_resign(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        reason: &str,
    ) -> Result<(), HistoryError> {
        (**self).record_resign(tenant_id, employee, reason)
    }

    fn record_department_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<DepartmentId>,
        to: Option<DepartmentId>,
        reason: &str,
    ) -> Result<(), HistoryError> {
        (**self).record_department_change(tenant_id, employee, from, to, reason)
    }

    fn record_position_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: &str,
    ) -> Result<(), HistoryError> {
        (**self).record_position_change(tenant_id, employee, from, to, reason)
    }

    fn record_grade_change(
        &self,
        tenant_id: TenantId,
        employee: &Employee,
        from: Option<String>,
        to: Option<String>,
        reason: &str,
    ) -> Result<(), HistoryError> {
        (**self).record_grade_change(tenant_id, employee, from, to, reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peopleforge_core::AggregateId;
    use crate::employee::EmploymentType;

    fn test_employee() -> Employee {
        let mut employee = Employee::hire(
            EmployeeId::new(AggregateId::new()),
            "EMP-2026-0001",
            "Hong Gildong",
            EmploymentType::Regular,
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        )
        .unwrap();
        employee.set_assignment(Some(DepartmentId::new()), Some("TL".to_string()), Some("G03".to_string()));
        employee
    }

    #[test]
    fn hire_entry_captures_target_assignment_and_hire_date() {
        let employee = test_employee();

        let entry = HistoryEntry::hire(&employee, "initial hire");

        assert_eq!(entry.employee_id, employee.id());
        assert_eq!(entry.change_type, HistoryChangeType::Hire);
        assert_eq!(entry.to_department_id, employee.department_id());
        assert_eq!(entry.to_position_code.as_deref(), Some("TL"));
        assert_eq!(entry.effective_date, employee.hire_date());
        assert!(entry.from_department_id.is_none());
    }

    #[test]
    fn resign_entry_uses_resign_date_and_clears_target_side() {
        let mut employee = test_employee();
        let resign_date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        employee.resign(resign_date).unwrap();

        let entry = HistoryEntry::resign(&employee, "moved on");

        assert_eq!(entry.change_type, HistoryChangeType::Resign);
        assert_eq!(entry.effective_date, resign_date);
        assert_eq!(entry.from_position_code.as_deref(), Some("TL"));
        assert!(entry.to_department_id.is_none());
    }

    #[test]
    fn department_change_entry_is_recorded_as_transfer() {
        let employee = test_employee();
        let from = employee.department_id();
        let to = Some(DepartmentId::new());

        let entry = HistoryEntry::department_change(&employee, from, to, "re-org");

        assert_eq!(entry.change_type, HistoryChangeType::Transfer);
        assert_eq!(entry.from_department_id, from);
        assert_eq!(entry.to_department_id, to);
        assert_eq!(entry.reason, "re-org");
    }
}
