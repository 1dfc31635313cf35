use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use peopleforge_core::{AggregateId, DepartmentId, DomainError, DomainResult};

/// Employee identifier (tenant-scoped via the directory it is stored in).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub AggregateId);

impl EmployeeId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Employee lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeStatus {
    Active,
    Resigned,
}

/// Employment contract kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentType {
    Regular,
    Contract,
}

/// An employee record as the directory stores it.
///
/// Personal fields (name, contact, employment type) are immutable once hired;
/// assignment fields change through organizational moves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    id: EmployeeId,
    employee_number: String,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    employment_type: EmploymentType,
    status: EmployeeStatus,
    department_id: Option<DepartmentId>,
    position_code: Option<String>,
    job_title_code: Option<String>,
    hire_date: NaiveDate,
    resign_date: Option<NaiveDate>,
}

impl Employee {
    /// Create a newly hired, active employee.
    pub fn hire(
        id: EmployeeId,
        employee_number: impl Into<String>,
        name: impl Into<String>,
        employment_type: EmploymentType,
        hire_date: NaiveDate,
    ) -> DomainResult<Self> {
        let employee_number = employee_number.into();
        let name = name.into();

        if employee_number.trim().is_empty() {
            return Err(DomainError::validation("employee number cannot be empty"));
        }
        if name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(Self {
            id,
            employee_number,
            name,
            email: None,
            phone: None,
            employment_type,
            status: EmployeeStatus::Active,
            department_id: None,
            position_code: None,
            job_title_code: None,
            hire_date,
            resign_date: None,
        })
    }

    pub fn set_contact(&mut self, email: Option<String>, phone: Option<String>) {
        self.email = email;
        self.phone = phone;
    }

    pub fn set_assignment(
        &mut self,
        department_id: Option<DepartmentId>,
        position_code: Option<String>,
        job_title_code: Option<String>,
    ) {
        self.department_id = department_id;
        self.position_code = position_code;
        self.job_title_code = job_title_code;
    }

    /// Mark the employee resigned as of `date`.
    ///
    /// Legal exactly once; a resigned employee cannot resign again.
    pub fn resign(&mut self, date: NaiveDate) -> DomainResult<()> {
        if self.status == EmployeeStatus::Resigned {
            return Err(DomainError::invalid_state("employee is already resigned"));
        }

        self.status = EmployeeStatus::Resigned;
        self.resign_date = Some(date);
        Ok(())
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn employee_number(&self) -> &str {
        &self.employee_number
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref()
    }

    pub fn employment_type(&self) -> EmploymentType {
        self.employment_type
    }

    pub fn status(&self) -> EmployeeStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == EmployeeStatus::Active
    }

    pub fn department_id(&self) -> Option<DepartmentId> {
        self.department_id
    }

    pub fn position_code(&self) -> Option<&str> {
        self.position_code.as_deref()
    }

    pub fn job_title_code(&self) -> Option<&str> {
        self.job_title_code.as_deref()
    }

    pub fn hire_date(&self) -> NaiveDate {
        self.hire_date
    }

    pub fn resign_date(&self) -> Option<NaiveDate> {
        self.resign_date
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_employee() -> Employee {
        Employee::hire(
            EmployeeId::new(AggregateId::new()),
            "HR-2026-0001",
            "Hong Gildong",
            EmploymentType::Regular,
            NaiveDate::from_ymd_opt(2026, 1, 15).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn hire_creates_active_employee() {
        let employee = test_employee();

        assert_eq!(employee.status(), EmployeeStatus::Active);
        assert!(employee.is_active());
        assert_eq!(employee.employee_number(), "HR-2026-0001");
        assert!(employee.resign_date().is_none());
    }

    #[test]
    fn hire_rejects_blank_number_and_name() {
        let id = EmployeeId::new(AggregateId::new());
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();

        let err = Employee::hire(id, "  ", "Hong Gildong", EmploymentType::Regular, date)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = Employee::hire(id, "HR-0001", "   ", EmploymentType::Regular, date)
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn resign_sets_status_and_date() {
        let mut employee = test_employee();
        let date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();

        employee.resign(date).unwrap();

        assert_eq!(employee.status(), EmployeeStatus::Resigned);
        assert_eq!(employee.resign_date(), Some(date));
        assert!(!employee.is_active());
    }

    #[test]
    fn resign_twice_is_rejected() {
        let mut employee = test_employee();
        let date = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();

        employee.resign(date).unwrap();
        let err = employee.resign(date).unwrap_err();

        assert!(matches!(err, DomainError::InvalidState(_)));
    }
}
