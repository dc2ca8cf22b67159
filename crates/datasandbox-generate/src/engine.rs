use std::path::PathBuf;
use std::time::Instant;

use tracing::{info, info_span, warn};

use datasandbox_core::derive_schema;

use crate::datasets::Dataset;
use crate::errors::GenerationError;
use crate::fs::{prepare_output_dir, write_json_atomic};
use crate::model::{DatasetReport, GenerateOptions, GenerationReport};
use crate::output::PartitionedBatchWriter;
use crate::record::RecordGenerator;

/// Name of the run report written next to the dataset directories.
pub const REPORT_FILE: &str = "generation_report.json";

/// Result of a generation run.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub out_dir: PathBuf,
    pub report_path: PathBuf,
    pub report: GenerationReport,
}

/// Runs datasets into partitioned Parquet output under one directory.
#[derive(Debug, Clone)]
pub struct GenerationEngine {
    options: GenerateOptions,
}

impl GenerationEngine {
    pub fn new(options: GenerateOptions) -> Self {
        Self { options }
    }

    /// Generate every dataset in order and write the run report.
    ///
    /// The first failing dataset aborts the run; the report is still written
    /// with the error and the datasets completed so far.
    pub fn run(&self, datasets: &[&dyn Dataset]) -> Result<GenerationResult, GenerationError> {
        let start = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let out_dir = self.options.out_dir.clone();
        std::fs::create_dir_all(&out_dir)?;

        let mut report = GenerationReport::new(run_id.clone(), &self.options);
        info!(
            run_id = %run_id,
            datasets = datasets.len(),
            seed = self.options.seed,
            batch_size = self.options.batch_size,
            partition_mode = %self.options.partition_mode,
            "generation started"
        );

        let mut failure = None;
        for dataset in datasets {
            match self.run_dataset(*dataset) {
                Ok(dataset_report) => report.record_dataset(dataset_report),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }
        report.duration_ms = start.elapsed().as_millis() as u64;

        let report_path = out_dir.join(REPORT_FILE);
        match failure {
            None => {
                write_json_atomic(&report_path, &report)?;
                info!(
                    run_id = %run_id,
                    datasets = report.datasets.len(),
                    rows = report.rows_total,
                    duration_ms = report.duration_ms,
                    "generation completed"
                );
                Ok(GenerationResult {
                    out_dir,
                    report_path,
                    report,
                })
            }
            Some(err) => {
                report.error = Some(err.to_string());
                write_json_atomic(&report_path, &report)?;
                warn!(run_id = %run_id, error = %err, "generation failed");
                Err(err)
            }
        }
    }

    /// Generate one dataset into `<out_dir>/<dataset name>`.
    ///
    /// Generator and writer are both closed whether or not streaming fails.
    pub fn run_dataset(&self, dataset: &dyn Dataset) -> Result<DatasetReport, GenerationError> {
        let span = info_span!("dataset", dataset = dataset.name());
        let _guard = span.enter();
        let start = Instant::now();

        let schema = derive_schema(dataset.fields())?;
        let dir = self.options.out_dir.join(dataset.name());
        prepare_output_dir(&dir, self.options.overwrite)?;

        let rows_requested = dataset.record_count();
        info!(
            rows = rows_requested,
            partition_field = dataset.partition_field(),
            path = %dir.display(),
            "dataset started"
        );

        let mut writer = PartitionedBatchWriter::new(
            schema,
            &dir,
            self.options.batch_size,
            dataset.partition_field(),
            self.options.partition_mode,
        )?;
        let mut generator = dataset.generator()?;

        let streamed = stream(&mut generator, &mut writer, rows_requested);
        generator.close();
        let closed = writer.close();

        let summary = match (streamed, closed) {
            (Ok(()), Ok(summary)) => summary,
            (Ok(()), Err(err)) => return Err(err.into()),
            (Err(err), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "closing writer after failure also failed");
                }
                return Err(err.into());
            }
        };

        if summary.rows != rows_requested {
            warn!(
                rows_requested,
                rows_written = summary.rows,
                "dataset ended before the requested record count"
            );
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            rows_written = summary.rows,
            partitions = summary.partitions.len(),
            batches = summary.batches,
            duration_ms,
            "dataset generated"
        );

        Ok(DatasetReport {
            dataset: dataset.name().to_string(),
            partition_field: dataset.partition_field().to_string(),
            output_dir: dir,
            rows_requested,
            rows_written: summary.rows,
            partitions: summary.partitions.len() as u64,
            batches: summary.batches,
            duration_ms,
        })
    }
}

fn stream(
    generator: &mut RecordGenerator,
    writer: &mut PartitionedBatchWriter,
    rows: u64,
) -> datasandbox_core::Result<()> {
    for record in generator.produce(rows) {
        writer.write_record(&record)?;
    }
    Ok(())
}
