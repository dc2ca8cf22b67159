mod config;
mod logging;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use datasandbox_core::Error as CoreError;
use datasandbox_generate::datasets::{self, DATASET_NAMES, Dataset};
use datasandbox_generate::{GenerationEngine, GenerationError, PartitionMode};
use thiserror::Error;
use tracing::info;

use config::{Config, LogFormat, Overrides};
use logging::{LOG_FILE, init_logging};

#[derive(Debug, Error)]
enum CliError {
    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config file: {0}")]
    Config(#[from] toml::de::Error),
    #[error("cannot encode config: {0}")]
    ConfigEncode(#[from] toml::ser::Error),
    #[error("logging error: {0}")]
    Logging(String),
}

#[derive(Parser, Debug)]
#[command(
    name = "datasandbox",
    version,
    about = "Generate partitioned synthetic datasets as Parquet"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate cost centers, employees and working time.
    Generate(GenerateArgs),
    /// Print the effective configuration as TOML.
    ShowConfig(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// TOML configuration file; flags override its values.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
    /// Output directory.
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Maximum rows per flushed batch.
    #[arg(long)]
    batch_size: Option<usize>,
    /// Number of cost centers.
    #[arg(long)]
    base_records: Option<u64>,
    /// Employees per cost center.
    #[arg(long)]
    employee_multi: Option<u64>,
    /// Working time records per employee.
    #[arg(long)]
    working_time_multi: Option<u64>,
    /// Seed for randomized fields.
    #[arg(long)]
    seed: Option<u64>,
    /// Replace existing dataset output.
    #[arg(long, value_name = "BOOL", action = clap::ArgAction::Set)]
    overwrite: Option<bool>,
    /// sequential or open.
    #[arg(long, value_name = "MODE")]
    partition_mode: Option<PartitionMode>,
    /// Log output format on stderr.
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Dataset(s) to generate; defaults to all, parents first.
    #[arg(long = "dataset", value_name = "NAME")]
    datasets: Vec<String>,
}

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();

    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::ShowConfig(args) => {
            let config = effective_config(args)?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn effective_config(args: ConfigArgs) -> Result<Config, CliError> {
    let mut config = Config::load(args.config.as_deref())?;
    config.apply(Overrides {
        dir: args.dir,
        batch_size: args.batch_size,
        base_records: args.base_records,
        employee_multi: args.employee_multi,
        working_time_multi: args.working_time_multi,
        seed: args.seed,
        overwrite: args.overwrite,
        partition_mode: args.partition_mode,
        log_format: args.log_format,
    });
    config.validate()?;
    Ok(config)
}

fn run_generate(args: GenerateArgs) -> Result<(), CliError> {
    let config = effective_config(args.config)?;
    let selected = select_datasets(&args.datasets)?;

    std::fs::create_dir_all(&config.output.dir)?;
    let log_path = config.output.dir.join(LOG_FILE);
    init_logging(
        config.logging.format,
        config.logging.file.then_some(log_path.as_path()),
    )?;

    let boxed = selected
        .iter()
        .map(|name| datasets::by_name(name, &config.hierarchy))
        .collect::<Result<Vec<_>, _>>()?;
    let refs: Vec<&dyn Dataset> = boxed.iter().map(|dataset| dataset.as_ref()).collect();

    let engine = GenerationEngine::new(config.generate_options());
    let result = engine.run(&refs)?;
    info!(
        run_id = %result.report.run_id,
        rows = result.report.rows_total,
        report = %result.report_path.display(),
        "run finished"
    );
    Ok(())
}

/// Requested dataset names in generation order; empty means all.
fn select_datasets(requested: &[String]) -> Result<Vec<&'static str>, CliError> {
    if let Some(unknown) = requested
        .iter()
        .find(|name| !DATASET_NAMES.contains(&name.as_str()))
    {
        return Err(CoreError::Configuration(format!(
            "unknown dataset '{unknown}' (expected one of {})",
            DATASET_NAMES.join(", ")
        ))
        .into());
    }
    Ok(DATASET_NAMES
        .iter()
        .copied()
        .filter(|name| requested.is_empty() || requested.iter().any(|r| r.as_str() == *name))
        .collect())
}
