//! Extraction of timing records from Actor IMM benchmark logs
//!
//! A [`family::Family`] describes one experiment family: which file names are worth a
//! look, how run parameters are encoded in them and which timings have to be pulled out
//! of the log text. [`extract::Extractor`] applies a family to a directory of logs.

pub mod config;
pub mod extract;
pub mod family;
pub mod record;
pub mod table;

#[cfg(test)]
mod extract_test;

use record::Parameter;
use std::path::PathBuf;
use thiserror::Error;

pub use config::{FamilyConfig, MetricConfig, Occurrence, Preset};
pub use extract::{Extraction, Extractor};
pub use family::{Family, FamilyError};
pub use record::{Algorithm, Metric, Record, RunIdentifier};

/// Reasons for a single log file to be skipped
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unexpected name pattern")]
    UnexpectedName,
    #[error("failed to decode {parameter} from '{value}'")]
    InvalidParameter { parameter: Parameter, value: String },
    #[error("failed to read log: {0}")]
    Unreadable(#[from] std::io::Error),
    #[error("could not find '{0}' metric")]
    MissingMetric(String),
    #[error("'{metric}' metric has a malformed value '{value}'")]
    MalformedMetric { metric: String, value: String },
}

/// Everything that was reported instead of producing a record
#[derive(Debug, Error)]
pub enum Diagnostic {
    #[error("directory {0:?} not found")]
    DirectoryNotFound(PathBuf),
    #[error("skipping {path:?}: {reason}")]
    Skipped { path: PathBuf, reason: ExtractError },
}
