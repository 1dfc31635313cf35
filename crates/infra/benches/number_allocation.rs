//! Allocation throughput under a single tenant's rule lock.

use std::sync::Arc;

use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, Criterion};

use peopleforge_core::TenantId;
use peopleforge_infra::{InMemoryEmployeeDirectory, LockingNumberAllocator};
use peopleforge_numbering::{EmployeeNumberGenerator, EmployeeNumberRule, SequenceResetPolicy};

fn bench_generate(c: &mut Criterion) {
    let directory = Arc::new(InMemoryEmployeeDirectory::new());
    let allocator = LockingNumberAllocator::new(directory);
    let tenant = TenantId::new();

    let mut rule = EmployeeNumberRule::new("HR");
    rule.sequence_reset_policy = SequenceResetPolicy::Never;
    allocator.configure_rule(tenant, rule);

    let date = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();

    c.bench_function("allocate_employee_number", |b| {
        b.iter(|| allocator.generate(tenant, date).unwrap())
    });
}

criterion_group!(benches, bench_generate);
criterion_main!(benches);
