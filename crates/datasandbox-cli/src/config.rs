use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use datasandbox_core::Error as CoreError;
use datasandbox_generate::{GenerateOptions, HierarchyConfig, PartitionMode};

use crate::CliError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub batch_size: usize,
    pub overwrite: bool,
    pub partition_mode: PartitionMode,
}

impl Default for OutputConfig {
    fn default() -> Self {
        let options = GenerateOptions::default();
        Self {
            dir: options.out_dir,
            batch_size: options.batch_size,
            overwrite: options.overwrite,
            partition_mode: options.partition_mode,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Also write JSON logs to `<dir>/logs.ndjson`.
    pub file: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            file: true,
        }
    }
}

/// Effective configuration: defaults, then the TOML file, then flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub hierarchy: HierarchyConfig,
    pub logging: LoggingConfig,
}

/// Flag values that override the configuration file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub dir: Option<PathBuf>,
    pub batch_size: Option<usize>,
    pub base_records: Option<u64>,
    pub employee_multi: Option<u64>,
    pub working_time_multi: Option<u64>,
    pub seed: Option<u64>,
    pub overwrite: Option<bool>,
    pub partition_mode: Option<PartitionMode>,
    pub log_format: Option<LogFormat>,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self, CliError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(toml::from_str(&content)?)
            }
            None => Ok(Config::default()),
        }
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(dir) = overrides.dir {
            self.output.dir = dir;
        }
        if let Some(batch_size) = overrides.batch_size {
            self.output.batch_size = batch_size;
        }
        if let Some(overwrite) = overrides.overwrite {
            self.output.overwrite = overwrite;
        }
        if let Some(mode) = overrides.partition_mode {
            self.output.partition_mode = mode;
        }
        if let Some(base_records) = overrides.base_records {
            self.hierarchy.base_records = base_records;
        }
        if let Some(multi) = overrides.employee_multi {
            self.hierarchy.employee_multi = multi;
        }
        if let Some(multi) = overrides.working_time_multi {
            self.hierarchy.working_time_multi = multi;
        }
        if let Some(seed) = overrides.seed {
            self.hierarchy.seed = seed;
        }
        if let Some(format) = overrides.log_format {
            self.logging.format = format;
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.output.batch_size == 0 {
            return Err(CoreError::Configuration(
                "batch_size must be positive".to_string(),
            ));
        }
        self.hierarchy.validate()
    }

    pub fn generate_options(&self) -> GenerateOptions {
        GenerateOptions {
            out_dir: self.output.dir.clone(),
            batch_size: self.output.batch_size,
            overwrite: self.output.overwrite,
            partition_mode: self.output.partition_mode,
            seed: self.hierarchy.seed,
        }
    }

    pub fn to_toml(&self) -> Result<String, CliError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
