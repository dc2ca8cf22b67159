pub mod columns;
pub mod parquet;

pub use self::parquet::{
    DATA_FILE, PartitionState, PartitionStats, PartitionSummary, PartitionedBatchWriter,
    WriteSummary,
};
