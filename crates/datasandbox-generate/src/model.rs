use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// How the writer treats records whose partition key changes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionMode {
    /// Records arrive grouped by key; one partition is open at a time.
    #[default]
    Sequential,
    /// Keys may interleave; every partition stays open until close.
    Open,
}

impl fmt::Display for PartitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PartitionMode::Sequential => f.write_str("sequential"),
            PartitionMode::Open => f.write_str("open"),
        }
    }
}

impl FromStr for PartitionMode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(PartitionMode::Sequential),
            "open" => Ok(PartitionMode::Open),
            other => Err(format!("unknown partition mode '{other}'")),
        }
    }
}

/// Options for the generation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOptions {
    /// Directory that receives one sub-directory per dataset.
    pub out_dir: PathBuf,
    /// Maximum rows per flushed batch (one Parquet row group).
    pub batch_size: usize,
    /// Remove existing dataset output instead of failing.
    pub overwrite: bool,
    pub partition_mode: PartitionMode,
    /// Seed recorded in the report; datasets carry their own copy.
    pub seed: u64,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("data"),
            batch_size: 100_000,
            overwrite: true,
            partition_mode: PartitionMode::Sequential,
            seed: 42,
        }
    }
}

/// Summary of one generated dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetReport {
    pub dataset: String,
    pub partition_field: String,
    pub output_dir: PathBuf,
    pub rows_requested: u64,
    pub rows_written: u64,
    pub partitions: u64,
    pub batches: u64,
    pub duration_ms: u64,
}

/// Report for a generation run, written as `generation_report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id: String,
    pub started_at: String,
    pub seed: u64,
    pub batch_size: usize,
    pub partition_mode: PartitionMode,
    pub datasets: Vec<DatasetReport>,
    pub rows_total: u64,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GenerationReport {
    pub fn new(run_id: String, options: &GenerateOptions) -> Self {
        Self {
            run_id,
            started_at: chrono::Utc::now().to_rfc3339(),
            seed: options.seed,
            batch_size: options.batch_size,
            partition_mode: options.partition_mode,
            datasets: Vec::new(),
            rows_total: 0,
            duration_ms: 0,
            error: None,
        }
    }

    pub fn record_dataset(&mut self, report: DatasetReport) {
        self.rows_total += report.rows_written;
        self.datasets.push(report);
    }
}
