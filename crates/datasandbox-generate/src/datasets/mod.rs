//! Built-in hierarchical datasets.
//!
//! Cost centers, employees and working time are generated parent first;
//! every child dataset groups its rows so that the foreign id lines up with
//! the parent's row numbering.

use serde::{Deserialize, Serialize};

use datasandbox_core::{Error, FieldDecl, Result, Value};

use crate::cursor::{IterCursor, MappedCursor, ValueCursor};
use crate::indexer::GroupIndexer;
use crate::record::{FieldCursor, RecordGenerator};

pub mod cost_centers;
pub mod employees;
pub mod working_time;

pub use cost_centers::CostCenters;
pub use employees::Employees;
pub use working_time::WorkingTime;

/// Dataset names in generation order.
pub const DATASET_NAMES: [&str; 3] = [cost_centers::NAME, employees::NAME, working_time::NAME];

/// A record layout plus the cursors that fill it.
pub trait Dataset {
    fn name(&self) -> &'static str;

    /// Column whose value selects the output partition.
    fn partition_field(&self) -> &'static str;

    fn fields(&self) -> &'static [FieldDecl];

    fn record_count(&self) -> u64;

    /// Fresh generator over the full dataset, fields in [`Dataset::fields`] order.
    fn generator(&self) -> Result<RecordGenerator>;
}

/// Sizes and seed shared by the three datasets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Number of cost centers.
    pub base_records: u64,
    /// Employees per cost center.
    pub employee_multi: u64,
    /// Working time records per employee.
    pub working_time_multi: u64,
    /// Cost centers per suborganisation.
    pub suborganisation_div: u64,
    /// Cost centers per company.
    pub company_div: u64,
    pub seed: u64,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            base_records: 1_000,
            employee_multi: 10,
            working_time_multi: 12,
            suborganisation_div: 10_000,
            company_div: 100_000,
            seed: 42,
        }
    }
}

impl HierarchyConfig {
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("base_records", self.base_records),
            ("employee_multi", self.employee_multi),
            ("working_time_multi", self.working_time_multi),
            ("suborganisation_div", self.suborganisation_div),
            ("company_div", self.company_div),
        ];
        for (name, value) in checks {
            if value == 0 {
                return Err(Error::Configuration(format!("{name} must be positive")));
            }
        }
        self.working_time_records().map(|_| ())
    }

    pub fn cost_center_records(&self) -> u64 {
        self.base_records
    }

    pub fn employee_records(&self) -> Result<u64> {
        self.base_records
            .checked_mul(self.employee_multi)
            .ok_or_else(|| Error::Configuration("employee record count overflows".to_string()))
    }

    pub fn working_time_records(&self) -> Result<u64> {
        self.employee_records()?
            .checked_mul(self.working_time_multi)
            .ok_or_else(|| {
                Error::Configuration("working time record count overflows".to_string())
            })
    }
}

/// All datasets in generation order.
pub fn all(config: &HierarchyConfig) -> Result<Vec<Box<dyn Dataset>>> {
    DATASET_NAMES
        .iter()
        .map(|name| by_name(name, config))
        .collect()
}

pub fn by_name(name: &str, config: &HierarchyConfig) -> Result<Box<dyn Dataset>> {
    config.validate()?;
    let dataset: Box<dyn Dataset> = match name {
        cost_centers::NAME => Box::new(CostCenters::new(config)),
        employees::NAME => Box::new(Employees::new(config)?),
        working_time::NAME => Box::new(WorkingTime::new(config)?),
        other => {
            return Err(Error::Configuration(format!(
                "unknown dataset '{other}' (expected one of {})",
                DATASET_NAMES.join(", ")
            )));
        }
    };
    Ok(dataset)
}

/// Field cursor mapping each group of `div` positions out of `n` to one value.
pub(crate) fn grouped<T, F>(name: &str, n: u64, div: u64, map: F) -> Result<FieldCursor>
where
    F: FnMut(u64) -> T + 'static,
    T: Clone + Into<Value> + 'static,
{
    let indexer = GroupIndexer::new(n, div)?;
    let cursor: ValueCursor = MappedCursor::new(indexer.cursor(), map).into_values();
    Ok(FieldCursor::new(name, cursor))
}

/// Field cursor repeating the id of each of `parents` rows `per_parent`
/// times, so child rows point at parent rows that exist.
pub(crate) fn child_of<T, F>(
    name: &str,
    parents: u64,
    per_parent: u64,
    map: F,
) -> Result<FieldCursor>
where
    F: FnMut(u64) -> T + 'static,
    T: Clone + Into<Value> + 'static,
{
    // With one parent the indexer's `n <= div` rule would give every child
    // its own group.
    if parents == 1 && per_parent > 1 {
        let ids = IterCursor::new((0..per_parent).map(|_| 0u64));
        let cursor: ValueCursor = MappedCursor::new(ids, map).into_values();
        return Ok(FieldCursor::new(name, cursor));
    }
    let n = parents
        .checked_mul(per_parent)
        .ok_or_else(|| Error::Configuration(format!("{name}: record count overflows")))?;
    grouped(name, n, per_parent, map)
}
