//! Partition-aware streaming Parquet writer.
//!
//! Records are bucketed by the value of one field into
//! `<root>/<field>=<key>/data.parquet`. Each partition buffers rows in typed
//! column builders and writes one row group every `max_batch` rows.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::{EnabledStatistics, WriterProperties};
use parquet::format::KeyValue;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use datasandbox_core::{Error, Result};

use crate::model::PartitionMode;
use crate::output::columns::{RowBuilders, check_supported};
use crate::record::CompositeRecord;

/// File name used inside every partition directory.
pub const DATA_FILE: &str = "data.parquet";

// The parquet file writer keeps a buffer of this size in front of the file.
const SINK_BUFFER: usize = 8 * 1024;
const PADDING: [u8; SINK_BUFFER] = [0; SINK_BUFFER];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionState {
    Open,
    Closed,
}

/// Point-in-time counters for one partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionStats {
    pub key: String,
    pub rows_written: u64,
    pub batches_flushed: u64,
    pub buffered_rows: usize,
    pub state: PartitionState,
}

/// Final counters for one partition file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionSummary {
    pub key: String,
    pub path: PathBuf,
    pub rows: u64,
    pub batches: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub rows: u64,
    pub batches: u64,
    pub partitions: Vec<PartitionSummary>,
}

struct OpenFile {
    writer: ArrowWriter<File>,
    builders: RowBuilders,
}

struct Partition {
    key: String,
    path: PathBuf,
    file: Option<OpenFile>,
    rows_written: u64,
    batches_flushed: u64,
}

impl Partition {
    fn state(&self) -> PartitionState {
        if self.file.is_some() {
            PartitionState::Open
        } else {
            PartitionState::Closed
        }
    }

    fn buffered_rows(&self) -> usize {
        self.file
            .as_ref()
            .map(|file| file.builders.len())
            .unwrap_or(0)
    }

    /// Write buffered rows as one row group, keeping the file open.
    fn flush(&mut self, schema: &SchemaRef) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        if file.builders.is_empty() {
            return Ok(());
        }

        let rows = file.builders.len();
        let batch = RecordBatch::try_new(schema.clone(), file.builders.finish())?;
        file.writer.write(&batch)?;
        file.writer.flush()?;
        self.rows_written += rows as u64;
        self.batches_flushed += 1;
        debug!(partition = %self.key, rows, batch = self.batches_flushed, "batch flushed");
        Ok(())
    }

    /// Move every flushed row group out of the writer's buffer and sync the
    /// file. Row groups are located through the footer, so readers skip the
    /// padding used to drain the buffer.
    fn persist(&mut self) -> Result<()> {
        let Some(file) = self.file.as_mut() else {
            return Ok(());
        };
        let target = file.writer.bytes_written() as u64;
        while on_disk(&file.writer, &self.path)? < target {
            file.writer
                .write_all(&PADDING)
                .map_err(|err| Error::io_at("write", &self.path, err))?;
        }
        file.writer
            .inner()
            .sync_data()
            .map_err(|err| Error::io_at("sync", &self.path, err))
    }

    /// Flush the tail, then close the file. The file is closed even when the
    /// flush fails; the first failure is returned.
    fn finish(&mut self, schema: &SchemaRef) -> Result<()> {
        let flushed = self.flush(schema);
        let Some(file) = self.file.take() else {
            return flushed;
        };
        let closed = file.writer.close().map(|_| ()).map_err(Error::from);
        debug!(partition = %self.key, rows = self.rows_written, "partition closed");
        flushed.and(closed)
    }
}

/// Streams records into one Parquet file per partition key.
///
/// In [`PartitionMode::Sequential`] only one partition is open at a time:
/// a new key closes the previous partition, and a key seen again after its
/// partition was closed is rejected. [`PartitionMode::Open`] accepts keys in
/// any order and keeps every partition open until [`close`](Self::close).
pub struct PartitionedBatchWriter {
    schema: SchemaRef,
    root: PathBuf,
    max_batch: usize,
    partition_field: String,
    partition_index: usize,
    mode: PartitionMode,
    partitions: Vec<Partition>,
    index: HashMap<String, usize>,
    current: Option<String>,
    finished: bool,
}

impl PartitionedBatchWriter {
    pub fn new(
        schema: SchemaRef,
        root: impl Into<PathBuf>,
        max_batch: usize,
        partition_field: &str,
        mode: PartitionMode,
    ) -> Result<Self> {
        if max_batch == 0 {
            return Err(Error::Configuration(
                "max batch size must be positive".to_string(),
            ));
        }
        let partition_index = schema.index_of(partition_field).map_err(|_| {
            Error::Configuration(format!(
                "partition field '{partition_field}' is not a schema column"
            ))
        })?;
        check_supported(&schema)?;

        Ok(Self {
            schema,
            root: root.into(),
            max_batch,
            partition_field: partition_field.to_string(),
            partition_index,
            mode,
            partitions: Vec::new(),
            index: HashMap::new(),
            current: None,
            finished: false,
        })
    }

    /// Append one record to its partition. At `max_batch` rows the batch is
    /// written as one row group and synced before this returns.
    pub fn write_record(&mut self, record: &CompositeRecord) -> Result<()> {
        let key = record
            .get(self.partition_index)
            .ok_or_else(|| {
                Error::Schema(format!(
                    "record has no value for partition field '{}'",
                    self.partition_field
                ))
            })?
            .partition_key()?;

        let slot = self.resolve_partition(&key)?;
        let partition = &mut self.partitions[slot];
        let Some(file) = partition.file.as_mut() else {
            return Err(Error::Composition(format!(
                "partition {}={key} is closed",
                self.partition_field
            )));
        };

        file.builders.append_row(record.values())?;
        if file.builders.len() >= self.max_batch {
            partition.flush(&self.schema)?;
            partition.persist()?;
        }
        Ok(())
    }

    /// Per-partition counters in creation order.
    pub fn stats(&self) -> Vec<PartitionStats> {
        self.partitions
            .iter()
            .map(|partition| PartitionStats {
                key: partition.key.clone(),
                rows_written: partition.rows_written,
                batches_flushed: partition.batches_flushed,
                buffered_rows: partition.buffered_rows(),
                state: partition.state(),
            })
            .collect()
    }

    /// Flush and close every resident partition.
    ///
    /// All partitions are attempted; failures are reported together.
    pub fn close(mut self) -> Result<WriteSummary> {
        Error::from_many(self.finish_all())?;

        let partitions: Vec<PartitionSummary> = self
            .partitions
            .iter()
            .map(|partition| PartitionSummary {
                key: partition.key.clone(),
                path: partition.path.clone(),
                rows: partition.rows_written,
                batches: partition.batches_flushed,
            })
            .collect();
        Ok(WriteSummary {
            rows: partitions.iter().map(|p| p.rows).sum(),
            batches: partitions.iter().map(|p| p.batches).sum(),
            partitions,
        })
    }

    fn finish_all(&mut self) -> Vec<Error> {
        self.finished = true;
        self.current = None;
        let schema = self.schema.clone();
        self.partitions
            .iter_mut()
            .filter_map(|partition| partition.finish(&schema).err())
            .collect()
    }

    fn resolve_partition(&mut self, key: &str) -> Result<usize> {
        if self.current.as_deref() == Some(key) {
            if let Some(&slot) = self.index.get(key) {
                return Ok(slot);
            }
        }

        if let Some(&slot) = self.index.get(key) {
            return match self.mode {
                PartitionMode::Open => {
                    self.current = Some(key.to_string());
                    Ok(slot)
                }
                PartitionMode::Sequential => Err(Error::Composition(format!(
                    "records for {}={key} arrived after its partition was closed",
                    self.partition_field
                ))),
            };
        }

        if self.mode == PartitionMode::Sequential {
            if let Some(previous) = self.current.take() {
                let slot = self.index.get(&previous).copied().ok_or_else(|| {
                    Error::Composition(format!(
                        "current partition {}={previous} is not resident",
                        self.partition_field
                    ))
                })?;
                self.partitions[slot].finish(&self.schema)?;
            }
        }

        let slot = self.open_partition(key)?;
        self.current = Some(key.to_string());
        Ok(slot)
    }

    fn open_partition(&mut self, key: &str) -> Result<usize> {
        let dir = self
            .root
            .join(format!("{}={key}", self.partition_field));
        std::fs::create_dir_all(&dir).map_err(|err| Error::io_at("create", &dir, err))?;
        let path = dir.join(DATA_FILE);
        let handle = File::create(&path).map_err(|err| Error::io_at("create", &path, err))?;

        let builders = RowBuilders::new(&self.schema)?;
        let props = writer_properties(self.max_batch, &self.partition_field, key);
        let writer = ArrowWriter::try_new(handle, self.schema.clone(), Some(props))?;

        debug!(partition = %key, path = %path.display(), "partition opened");
        let slot = self.partitions.len();
        self.partitions.push(Partition {
            key: key.to_string(),
            path,
            file: Some(OpenFile { writer, builders }),
            rows_written: 0,
            batches_flushed: 0,
        });
        self.index.insert(key.to_string(), slot);
        Ok(slot)
    }
}

impl Drop for PartitionedBatchWriter {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        for err in self.finish_all() {
            warn!(root = %self.root.display(), error = %err, "failed to close partition on drop");
        }
    }
}

fn on_disk(writer: &ArrowWriter<File>, path: &Path) -> Result<u64> {
    writer
        .inner()
        .metadata()
        .map(|meta| meta.len())
        .map_err(|err| Error::io_at("stat", path, err))
}

fn writer_properties(max_batch: usize, field: &str, key: &str) -> WriterProperties {
    let metadata = vec![
        KeyValue {
            key: "datasandbox.version".to_string(),
            value: Some(env!("CARGO_PKG_VERSION").to_string()),
        },
        KeyValue {
            key: "datasandbox.partition".to_string(),
            value: Some(format!("{field}={key}")),
        },
    ];

    WriterProperties::builder()
        .set_compression(Compression::ZSTD(ZstdLevel::default()))
        .set_dictionary_enabled(true)
        .set_statistics_enabled(EnabledStatistics::Chunk)
        .set_max_row_group_size(max_batch)
        .set_key_value_metadata(Some(metadata))
        .build()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use arrow::datatypes::{DataType, Field, Schema};
    use datasandbox_core::Value;

    use super::*;

    fn temp_root(label: &str) -> PathBuf {
        std::env::temp_dir().join(format!("datasandbox_writer_{label}_{}", uuid::Uuid::new_v4()))
    }

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("group", DataType::Utf8, false),
            Field::new("n", DataType::Int64, false),
        ]))
    }

    fn record(group: &str, n: i64) -> CompositeRecord {
        CompositeRecord::new(vec![Value::from(group), Value::Int(n)])
    }

    #[test]
    fn rejects_zero_batch_and_unknown_field() {
        let root = temp_root("config");
        assert!(matches!(
            PartitionedBatchWriter::new(schema(), &root, 0, "group", PartitionMode::Sequential),
            Err(Error::Configuration(_))
        ));
        assert!(matches!(
            PartitionedBatchWriter::new(schema(), &root, 4, "missing", PartitionMode::Sequential),
            Err(Error::Configuration(_))
        ));
        assert!(!root.exists());
    }

    #[test]
    fn sequential_mode_keeps_one_partition_open() {
        let root = temp_root("sequential");
        let mut writer =
            PartitionedBatchWriter::new(schema(), &root, 10, "group", PartitionMode::Sequential)
                .unwrap();
        writer.write_record(&record("a", 1)).unwrap();
        writer.write_record(&record("a", 2)).unwrap();
        writer.write_record(&record("b", 3)).unwrap();

        let stats = writer.stats();
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0].state, PartitionState::Closed);
        assert_eq!(stats[0].rows_written, 2);
        assert_eq!(stats[1].state, PartitionState::Open);
        assert_eq!(stats[1].buffered_rows, 1);

        let summary = writer.close().unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.partitions.len(), 2);
        assert!(root.join("group=a").join(DATA_FILE).exists());
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn conversion_failure_keeps_buffered_rows() {
        let root = temp_root("conversion");
        let mut writer =
            PartitionedBatchWriter::new(schema(), &root, 10, "group", PartitionMode::Sequential)
                .unwrap();
        writer.write_record(&record("a", 1)).unwrap();
        let bad = CompositeRecord::new(vec![Value::from("a"), Value::from("x")]);
        assert!(matches!(
            writer.write_record(&bad),
            Err(Error::Conversion { .. })
        ));
        writer.write_record(&record("a", 2)).unwrap();
        let summary = writer.close().unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.batches, 1);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn key_with_separator_is_rejected() {
        let root = temp_root("separator");
        let mut writer =
            PartitionedBatchWriter::new(schema(), &root, 10, "group", PartitionMode::Open)
                .unwrap();
        writer.write_record(&record("a_b", 1)).unwrap();
        assert!(matches!(
            writer.write_record(&record("a/b", 2)),
            Err(Error::Composition(_))
        ));
        let summary = writer.close().unwrap();
        assert_eq!(summary.partitions.len(), 1);
        assert_eq!(summary.rows, 1);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn huge_batch_size_does_not_reserve_memory() {
        let root = temp_root("huge_batch");
        let mut writer = PartitionedBatchWriter::new(
            schema(),
            &root,
            usize::MAX / 8,
            "group",
            PartitionMode::Open,
        )
        .unwrap();
        writer.write_record(&record("a", 1)).unwrap();
        writer.write_record(&record("b", 2)).unwrap();
        assert_eq!(writer.stats()[0].buffered_rows, 1);
        let summary = writer.close().unwrap();
        assert_eq!(summary.rows, 2);
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn drop_without_close_finishes_files() {
        let root = temp_root("drop");
        {
            let mut writer = PartitionedBatchWriter::new(
                schema(),
                &root,
                10,
                "group",
                PartitionMode::Sequential,
            )
            .unwrap();
            writer.write_record(&record("a", 1)).unwrap();
        }
        let len = std::fs::metadata(root.join("group=a").join(DATA_FILE))
            .unwrap()
            .len();
        assert!(len > 8);
        std::fs::remove_dir_all(&root).ok();
    }
}
