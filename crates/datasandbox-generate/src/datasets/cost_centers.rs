use datasandbox_core::{DeclaredType, FieldDecl, Result};

use super::{Dataset, HierarchyConfig, grouped};
use crate::record::RecordGenerator;

pub const NAME: &str = "cost_centers";

const FIELDS: &[FieldDecl] = &[
    FieldDecl::new("cost_center", DeclaredType::Text),
    FieldDecl::new("cost_center_name", DeclaredType::Text),
    FieldDecl::new("suborganisation", DeclaredType::Text),
    FieldDecl::new("company_name", DeclaredType::Text),
    FieldDecl::new("company_number", DeclaredType::I64),
];

/// Root of the hierarchy: one row per cost center, grouped into
/// suborganisations and companies.
#[derive(Debug, Clone)]
pub struct CostCenters {
    records: u64,
    suborganisation_div: u64,
    company_div: u64,
}

impl CostCenters {
    pub fn new(config: &HierarchyConfig) -> Self {
        Self {
            records: config.cost_center_records(),
            suborganisation_div: config.suborganisation_div,
            company_div: config.company_div,
        }
    }
}

impl Dataset for CostCenters {
    fn name(&self) -> &'static str {
        NAME
    }

    fn partition_field(&self) -> &'static str {
        "suborganisation"
    }

    fn fields(&self) -> &'static [FieldDecl] {
        FIELDS
    }

    fn record_count(&self) -> u64 {
        self.records
    }

    fn generator(&self) -> Result<RecordGenerator> {
        let n = self.records;
        Ok(RecordGenerator::new(vec![
            grouped("cost_center", n, 1, |id| (id + 1).to_string())?,
            grouped("cost_center_name", n, 1, |id| format!("CostCenter {}", id + 1))?,
            grouped("suborganisation", n, self.suborganisation_div, |id| {
                format!("Suborganisation {}", id + 1)
            })?,
            grouped("company_name", n, self.company_div, |id| {
                format!("CompanyName {}", id + 1)
            })?,
            grouped("company_number", n, self.company_div, |id| (id + 1) as i64)?,
        ]))
    }
}
