use immbench_analysis::{Summarizer, DEFAULT_CONFIDENCE};
use immbench_ingest::{Family, FamilyConfig, FamilyError, Preset};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    io::Error,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::{error, warn};

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read config file")]
    Unreadable(#[from] Error),
    #[error("Failed to parse config file: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
    #[error("Family failed to load: {0}")]
    InvalidFamily(#[from] FamilyError),
    #[error("Job {0} is not defined")]
    UnknownJob(String),
    #[error("Job {0} names neither a preset nor a family with an output")]
    IncompleteJob(String),
    #[error("Configuration contains errors")]
    Preflight,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    // log directory -> table jobs, run first
    #[serde(default)]
    pub extract: BTreeMap<String, ExtractJob>,
    // table -> grouped statistics jobs, may consume extract outputs
    #[serde(default)]
    pub summarize: BTreeMap<String, SummaryJob>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ExtractJob {
    #[serde(default = "default_input")]
    pub input: PathBuf,
    // defaults to the preset's table name
    pub output: Option<PathBuf>,
    pub preset: Option<Preset>,
    pub family: Option<FamilyConfig>,
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SummaryJob {
    pub input: PathBuf,
    pub output: PathBuf,
    #[serde(default)]
    pub group_by: Vec<String>,
    pub values: Vec<String>,
    #[serde(default)]
    pub only: BTreeMap<String, Vec<String>>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

impl ExtractJob {
    pub fn from_preset(preset: Preset, input: PathBuf, output: Option<PathBuf>) -> Self {
        Self {
            input,
            output,
            preset: Some(preset),
            family: None,
            parallel: false,
        }
    }

    pub fn family_config(&self) -> Option<FamilyConfig> {
        self.family
            .clone()
            .or_else(|| self.preset.map(|preset| preset.family()))
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output
            .clone()
            .or_else(|| self.preset.map(|preset| preset.default_output()))
    }

    /// compile the family, fails for jobs that didn't pass the preflight checks
    pub fn load_family(&self, name: &str) -> Result<(Family, PathBuf), ConfigErrors> {
        match (self.family_config(), self.output_path()) {
            (Some(config), Some(output)) => Ok((Family::load(&config)?, output)),
            _ => Err(ConfigErrors::IncompleteJob(name.to_owned())),
        }
    }
}

impl SummaryJob {
    pub fn summarizer(&self) -> Summarizer {
        Summarizer {
            group_by: self.group_by.clone(),
            values: self.values.clone(),
            only: self.only.clone(),
            confidence: self.confidence,
        }
    }
}

impl RunnerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let text = fs::read_to_string(path)?;

        Ok(serde_yaml::from_str(&text)?)
    }

    /// drop every job not listed in `jobs`, an empty selection keeps everything
    pub fn select(&mut self, jobs: &[String]) -> Result<(), ConfigErrors> {
        if jobs.is_empty() {
            return Ok(());
        }

        if let Some(unknown) = jobs.iter().find(|job| {
            !self.extract.contains_key(job.as_str()) && !self.summarize.contains_key(job.as_str())
        }) {
            return Err(ConfigErrors::UnknownJob(unknown.clone()));
        }

        self.extract.retain(|name, _| jobs.contains(name));
        self.summarize.retain(|name, _| jobs.contains(name));

        Ok(())
    }

    /// returns true if the configuration contains errors, every error is logged
    pub fn preflight_checks(&self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        if self.extract.is_empty() && self.summarize.is_empty() {
            error!("No job was defined, nothing to do");
            contains_error = true;
        }

        for (name, job) in self.extract.iter() {
            match (&job.preset, &job.family) {
                (Some(_), Some(_)) => {
                    error!("extract.{name} sets both 'preset' and 'family', only one is allowed");
                    contains_error = true;
                }
                (None, None) => {
                    error!("extract.{name} needs either a 'preset' or a 'family'");
                    contains_error = true;
                }
                (None, Some(family)) => {
                    if job.output.is_none() {
                        error!("extract.{name}.output is required for a custom family");
                        contains_error = true;
                    }

                    if let Err(e) = Family::load(family) {
                        error!("extract.{name}.family is invalid: {e}");
                        contains_error = true;
                    }
                }
                (Some(_), None) => {}
            }

            if !job.input.is_dir() {
                warn!(
                    "extract.{name}.input {} is not a directory, the table will only hold a header",
                    job.input.to_string_lossy()
                );
            }
        }

        for (name, job) in self.summarize.iter() {
            if job.values.is_empty() {
                error!("summarize.{name}.values must name at least one column");
                contains_error = true;
            }

            if !(job.confidence > 0.0 && job.confidence < 1.0) {
                error!(
                    "summarize.{name}.confidence ({}) must lie strictly between 0 and 1",
                    job.confidence
                );
                contains_error = true;
            }

            if job.group_by.is_empty() {
                warn!("summarize.{name}.group_by is empty, the whole table forms a single group");
            }
        }

        // jobs overwriting each other's tables are almost certainly a copy-paste mistake
        let outputs = self
            .extract
            .values()
            .filter_map(ExtractJob::output_path)
            .chain(self.summarize.values().map(|job| job.output.clone()))
            .collect_vec();
        for output in outputs.iter().duplicates() {
            error!(
                "{} is the output of more than one job",
                output.to_string_lossy()
            );
            contains_error = true;
        }

        contains_error
    }
}

fn default_input() -> PathBuf {
    PathBuf::from("results")
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}
