//! Locking employee-number allocator.
//!
//! One mutex per tenant serializes the read-modify-write of that tenant's
//! numbering rule; tenants never contend with each other. The fallback path
//! (no rule configured) mutates nothing and therefore takes no rule lock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use chrono::{Datelike, NaiveDate};

use peopleforge_core::TenantId;
use peopleforge_employee::EmployeeDirectory;
use peopleforge_numbering::{
    fallback_number, ArchivedNumberResolver, EmployeeNumberGenerator, EmployeeNumberRule,
    NoArchivedNumbers, NumberingError,
};

/// Per-tenant number allocator over in-memory rule state.
///
/// Two concurrent `generate` calls for the same tenant serialize on that
/// tenant's rule mutex, so the returned numbers are pairwise distinct. The
/// rule state is advanced before the lock is released.
pub struct LockingNumberAllocator<D> {
    rules: RwLock<HashMap<TenantId, Arc<Mutex<EmployeeNumberRule>>>>,
    directory: D,
    archive: Arc<dyn ArchivedNumberResolver>,
}

impl<D> LockingNumberAllocator<D> {
    pub fn new(directory: D) -> Self {
        Self::with_archive(directory, Arc::new(NoArchivedNumbers))
    }

    pub fn with_archive(directory: D, archive: Arc<dyn ArchivedNumberResolver>) -> Self {
        Self {
            rules: RwLock::new(HashMap::new()),
            directory,
            archive,
        }
    }

    /// Install (or replace) the tenant's active numbering rule.
    pub fn configure_rule(&self, tenant_id: TenantId, rule: EmployeeNumberRule) {
        if let Ok(mut rules) = self.rules.write() {
            rules.insert(tenant_id, Arc::new(Mutex::new(rule)));
        }
    }

    /// Snapshot of the tenant's active rule, if any.
    pub fn active_rule(&self, tenant_id: TenantId) -> Option<EmployeeNumberRule> {
        let cell = self.rules.read().ok()?.get(&tenant_id).cloned()?;
        let rule = cell.lock().ok()?;
        Some(rule.clone())
    }

    fn rule_cell(&self, tenant_id: TenantId) -> Result<Option<Arc<Mutex<EmployeeNumberRule>>>, NumberingError> {
        let rules = self
            .rules
            .read()
            .map_err(|_| NumberingError::Unavailable("rule table lock poisoned".to_string()))?;
        Ok(rules.get(&tenant_id).cloned())
    }
}

impl<D> EmployeeNumberGenerator for LockingNumberAllocator<D>
where
    D: EmployeeDirectory,
{
    fn generate(
        &self,
        tenant_id: TenantId,
        effective_date: NaiveDate,
    ) -> Result<String, NumberingError> {
        match self.rule_cell(tenant_id)? {
            Some(cell) => {
                let mut rule = cell
                    .lock()
                    .map_err(|_| NumberingError::Unavailable("rule lock poisoned".to_string()))?;
                Ok(rule.next_number(effective_date))
            }
            None => {
                // Degenerate scheme from the head-count; nothing to persist.
                let count = self
                    .directory
                    .count(tenant_id)
                    .map_err(|e| NumberingError::Unavailable(e.to_string()))?;
                tracing::warn!(
                    tenant_id = %tenant_id,
                    "no numbering rule configured, falling back to year-count scheme"
                );
                Ok(fallback_number(effective_date.year(), count))
            }
        }
    }

    fn find_existing_number(
        &self,
        tenant_id: TenantId,
        name: &str,
        birth_date: NaiveDate,
    ) -> Result<Option<String>, NumberingError> {
        let allow_reuse = match self.rule_cell(tenant_id)? {
            Some(cell) => {
                let rule = cell
                    .lock()
                    .map_err(|_| NumberingError::Unavailable("rule lock poisoned".to_string()))?;
                rule.allow_reuse
            }
            None => false,
        };

        if !allow_reuse {
            return Ok(None);
        }

        Ok(self.archive.resolve(tenant_id, name, birth_date))
    }
}
