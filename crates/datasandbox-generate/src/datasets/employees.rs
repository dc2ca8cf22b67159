use chrono::{DateTime, NaiveDateTime};
use rand::Rng;

use datasandbox_core::{DeclaredType, FieldDecl, Result};

use super::{Dataset, HierarchyConfig, child_of, grouped};
use crate::record::RecordGenerator;
use crate::seed::{field_rng, hash_seed};

pub const NAME: &str = "employees";

const FIELDS: &[FieldDecl] = &[
    FieldDecl::new("employee_id", DeclaredType::I64),
    FieldDecl::new("employee_name", DeclaredType::Text),
    FieldDecl::new("cost_center", DeclaredType::I64),
    FieldDecl::new("is_employed", DeclaredType::Bool),
    FieldDecl::new("is_active", DeclaredType::Bool),
    FieldDecl::new("hired_at", DeclaredType::DateTime),
];

// Random stream ids, one per randomized field.
const EMPLOYED_STREAM: u64 = 1;
const ACTIVE_STREAM: u64 = 2;
const HIRED_STREAM: u64 = 3;

// 2000-01-01T00:00:00Z and 2026-01-01T00:00:00Z.
const HIRED_FROM: i64 = 946_684_800;
const HIRED_UNTIL: i64 = 1_767_225_600;

/// `employee_multi` employees per cost center.
#[derive(Debug, Clone)]
pub struct Employees {
    records: u64,
    cost_centers: u64,
    per_cost_center: u64,
    seed: u64,
}

impl Employees {
    pub fn new(config: &HierarchyConfig) -> Result<Self> {
        Ok(Self {
            records: config.employee_records()?,
            cost_centers: config.cost_center_records(),
            per_cost_center: config.employee_multi,
            seed: hash_seed(config.seed, NAME),
        })
    }
}

impl Dataset for Employees {
    fn name(&self) -> &'static str {
        NAME
    }

    fn partition_field(&self) -> &'static str {
        "cost_center"
    }

    fn fields(&self) -> &'static [FieldDecl] {
        FIELDS
    }

    fn record_count(&self) -> u64 {
        self.records
    }

    fn generator(&self) -> Result<RecordGenerator> {
        let n = self.records;
        let mut employed = field_rng(self.seed, EMPLOYED_STREAM);
        let mut active = field_rng(self.seed, ACTIVE_STREAM);
        let mut hired = field_rng(self.seed, HIRED_STREAM);

        Ok(RecordGenerator::new(vec![
            grouped("employee_id", n, 1, |id| (id + 1) as i64)?,
            grouped("employee_name", n, 1, |id| format!("Employee {}", id + 1))?,
            child_of("cost_center", self.cost_centers, self.per_cost_center, |id| {
                (id + 1) as i64
            })?,
            grouped("is_employed", n, 1, move |_| employed.random_bool(0.5))?,
            grouped("is_active", n, 1, move |_| active.random_bool(0.5))?,
            grouped("hired_at", n, 1, move |_| {
                hire_date(hired.random_range(HIRED_FROM..HIRED_UNTIL))
            })?,
        ]))
    }
}

fn hire_date(seconds: i64) -> NaiveDateTime {
    DateTime::from_timestamp(seconds, 0)
        .unwrap_or_default()
        .naive_utc()
}
