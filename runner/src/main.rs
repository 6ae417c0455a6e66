mod config;
mod jobs;

#[cfg(test)]
mod config_test;

use clap::{ArgAction, Parser, Subcommand};
use config::{ExtractJob, RunnerConfig, SummaryJob};
use immbench_analysis::DEFAULT_CONFIDENCE;
use immbench_ingest::Preset;
use std::{collections::BTreeMap, path::PathBuf, process::ExitCode};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Post-processing of Actor IMM benchmark logs
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// raise the log level, RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a table from a directory of logs with a built-in family
    Extract {
        /// total-by-k, total-by-eps, phases-by-cores or kloops-matrixgen
        #[arg(long)]
        preset: Preset,
        #[arg(long, default_value = "results")]
        input: PathBuf,
        /// defaults to the preset's table name
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        parallel: bool,
    },
    /// Group an extracted table and compute mean, std and confidence intervals
    Summarize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_delimiter = ',')]
        group_by: Vec<String>,
        #[arg(long = "value", required = true)]
        values: Vec<String>,
        /// keep only matching rows, e.g., `algorithm=1D,2D`
        #[arg(long, value_parser = parse_only)]
        only: Vec<(String, Vec<String>)>,
        #[arg(long, default_value_t = DEFAULT_CONFIDENCE)]
        confidence: f64,
    },
    /// Run the jobs of a YAML configuration file
    Run {
        #[arg(short, long, default_value = "immbench.yaml")]
        config: PathBuf,
        /// only run the named jobs
        #[arg(long = "job")]
        jobs: Vec<String>,
    },
}

fn parse_only(value: &str) -> Result<(String, Vec<String>), String> {
    match value.split_once('=') {
        Some((column, accepted)) if !column.is_empty() => Ok((
            column.to_owned(),
            accepted.split(',').map(str::to_owned).collect(),
        )),
        _ => Err(format!("expected <column>=<value>[,<value>...], got '{value}'")),
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

impl Command {
    fn into_config(self) -> Result<RunnerConfig, config::ConfigErrors> {
        match self {
            Self::Extract {
                preset,
                input,
                output,
                parallel,
            } => {
                let mut job = ExtractJob::from_preset(preset, input, output);
                job.parallel = parallel;

                Ok(RunnerConfig {
                    extract: BTreeMap::from([(preset.to_string(), job)]),
                    summarize: BTreeMap::new(),
                })
            }
            Self::Summarize {
                input,
                output,
                group_by,
                values,
                only,
                confidence,
            } => Ok(RunnerConfig {
                extract: BTreeMap::new(),
                summarize: BTreeMap::from([(
                    "summarize".to_owned(),
                    SummaryJob {
                        input,
                        output,
                        group_by,
                        values,
                        only: only.into_iter().collect(),
                        confidence,
                    },
                )]),
            }),
            Self::Run { config, jobs } => {
                let mut loaded = RunnerConfig::load(&config)?;
                loaded.select(&jobs)?;

                Ok(loaded)
            }
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match cli.command.into_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");

            return ExitCode::FAILURE;
        }
    };

    if config.preflight_checks() {
        error!("{}", config::ConfigErrors::Preflight);

        return ExitCode::FAILURE;
    }

    match jobs::run_all(&config) {
        0 => ExitCode::SUCCESS,
        failed => {
            error!("{failed} job(s) failed");

            ExitCode::FAILURE
        }
    }
}
