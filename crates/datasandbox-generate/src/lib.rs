//! Deterministic synthetic data generation for datasandbox.
//!
//! Group indexers and cursors describe how each field varies across a
//! dataset, a record generator zips them into rows, and the partitioned
//! writer streams those rows into Parquet files, one per partition key.

pub mod cursor;
pub mod datasets;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod indexer;
pub mod model;
pub mod output;
pub mod record;
pub mod seed;

pub use cursor::{Cursor, IterCursor, MappedCursor, ValueCursor};
pub use datasets::{Dataset, HierarchyConfig};
pub use engine::{GenerationEngine, GenerationResult, REPORT_FILE};
pub use errors::GenerationError;
pub use indexer::{GroupIds, GroupIndexer, GroupSpec};
pub use model::{DatasetReport, GenerateOptions, GenerationReport, PartitionMode};
pub use output::{PartitionedBatchWriter, WriteSummary};
pub use record::{CompositeRecord, FieldCursor, RecordGenerator};
