use chrono::NaiveDate;
use rand::Rng;

use datasandbox_core::{DeclaredType, FieldDecl, Result};

use super::{Dataset, HierarchyConfig, child_of, grouped};
use crate::record::RecordGenerator;
use crate::seed::{field_rng, hash_seed};

pub const NAME: &str = "working_time";

const FIELDS: &[FieldDecl] = &[
    FieldDecl::new("employee_id", DeclaredType::I64),
    FieldDecl::date("date"),
    FieldDecl::new("hours", DeclaredType::F64),
];

const DATE_STREAM: u64 = 1;
const HOURS_STREAM: u64 = 2;

const FIRST_YEAR: i32 = 2020;
const LAST_YEAR: i32 = 2025;

/// `working_time_multi` monthly bookings per employee.
#[derive(Debug, Clone)]
pub struct WorkingTime {
    records: u64,
    employees: u64,
    per_employee: u64,
    seed: u64,
}

impl WorkingTime {
    pub fn new(config: &HierarchyConfig) -> Result<Self> {
        Ok(Self {
            records: config.working_time_records()?,
            employees: config.employee_records()?,
            per_employee: config.working_time_multi,
            seed: hash_seed(config.seed, NAME),
        })
    }
}

impl Dataset for WorkingTime {
    fn name(&self) -> &'static str {
        NAME
    }

    fn partition_field(&self) -> &'static str {
        "employee_id"
    }

    fn fields(&self) -> &'static [FieldDecl] {
        FIELDS
    }

    fn record_count(&self) -> u64 {
        self.records
    }

    fn generator(&self) -> Result<RecordGenerator> {
        let n = self.records;
        let mut dates = field_rng(self.seed, DATE_STREAM);
        let mut hours = field_rng(self.seed, HOURS_STREAM);

        Ok(RecordGenerator::new(vec![
            child_of("employee_id", self.employees, self.per_employee, |id| {
                (id + 1) as i64
            })?,
            grouped("date", n, 1, move |_| {
                month_start(
                    dates.random_range(FIRST_YEAR..=LAST_YEAR),
                    dates.random_range(1..=12),
                )
            })?,
            // Quarter hours between 0.25 and 12.
            grouped("hours", n, 1, move |_| {
                f64::from(hours.random_range(1..=48u32)) * 0.25
            })?,
        ]))
    }
}

fn month_start(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use chrono::Datelike;
    use datasandbox_core::Value;

    use super::*;

    fn rows(seed: u64) -> Vec<Vec<Value>> {
        let config = HierarchyConfig {
            base_records: 2,
            employee_multi: 2,
            working_time_multi: 3,
            seed,
            ..HierarchyConfig::default()
        };
        let dataset = WorkingTime::new(&config).unwrap();
        let mut generator = dataset.generator().unwrap();
        generator.produce(u64::MAX).map(|r| r.into_values()).collect()
    }

    #[test]
    fn bookings_group_by_employee() {
        let rows = rows(3);
        assert_eq!(rows.len(), 12);
        let ids: Vec<&Value> = rows.iter().map(|r| &r[0]).collect();
        assert_eq!(ids[0], &Value::Int(1));
        assert_eq!(ids[2], &Value::Int(1));
        assert_eq!(ids[3], &Value::Int(2));
        assert_eq!(ids[11], &Value::Int(4));
    }

    #[test]
    fn dates_and_hours_stay_in_range() {
        for row in rows(11) {
            let Value::Date(date) = &row[1] else {
                panic!("date is not a calendar date: {:?}", row[1]);
            };
            assert_eq!(date.day(), 1);
            assert!((FIRST_YEAR..=LAST_YEAR).contains(&date.year()));

            let Value::Float(hours) = &row[2] else {
                panic!("hours is not a float: {:?}", row[2]);
            };
            assert!((0.25..=12.0).contains(hours));
            assert_eq!((hours * 4.0).fract(), 0.0);
        }
    }
}
