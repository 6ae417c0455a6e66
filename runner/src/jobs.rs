use crate::config::{ConfigErrors, ExtractJob, RunnerConfig, SummaryJob};
use immbench_analysis::AnalysisError;
use immbench_ingest::{table::write_table, Extractor};
use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::PathBuf,
};
use thiserror::Error;
use tracing::{error, info, instrument};

#[derive(Debug, Error)]
pub enum JobError {
    #[error("Job is misconfigured: {0}")]
    Config(#[from] ConfigErrors),
    #[error("Failed to open {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write table: {0}")]
    Table(#[from] csv::Error),
    #[error("Failed to summarize table: {0}")]
    Analysis(#[from] AnalysisError),
}

/// scan the job's directory and write one row per extracted record
/// returns the number of rows
#[instrument(skip(job), level = "info")]
pub fn run_extract(name: &str, job: &ExtractJob) -> Result<usize, JobError> {
    let (family, output) = job.load_family(name)?;
    let extractor = Extractor::new(family).parallel(job.parallel);
    let extraction = extractor.extract(&job.input);

    let file = File::create(&output).map_err(|source| JobError::Io {
        path: output.clone(),
        source,
    })?;
    write_table(extractor.family(), &extraction.records, BufWriter::new(file))?;

    info!(
        rows = extraction.records.len(),
        skipped = extraction.diagnostics.len(),
        "Results have been saved to {}",
        output.to_string_lossy()
    );

    Ok(extraction.records.len())
}

/// returns the number of groups
#[instrument(skip(job), level = "info")]
pub fn run_summary(name: &str, job: &SummaryJob) -> Result<usize, JobError> {
    let input = File::open(&job.input).map_err(|source| JobError::Io {
        path: job.input.clone(),
        source,
    })?;
    let summary = job.summarizer().summarize(BufReader::new(input))?;

    let output = File::create(&job.output).map_err(|source| JobError::Io {
        path: job.output.clone(),
        source,
    })?;
    summary.write(BufWriter::new(output))?;

    info!(
        groups = summary.groups.len(),
        "Summary has been saved to {}",
        job.output.to_string_lossy()
    );

    Ok(summary.groups.len())
}

/// run every extract job, then every summary job; a failing job doesn't stop the others
/// returns the number of failed jobs
pub fn run_all(config: &RunnerConfig) -> usize {
    let mut failed = 0;

    for (name, job) in config.extract.iter() {
        if let Err(e) = run_extract(name, job) {
            error!("extract.{name} failed: {e}");
            failed += 1;
        }
    }

    for (name, job) in config.summarize.iter() {
        if let Err(e) = run_summary(name, job) {
            error!("summarize.{name} failed: {e}");
            failed += 1;
        }
    }

    info!("Done with processing");

    failed
}
