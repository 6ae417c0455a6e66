use crate::{
    config::{FamilyConfig, MetricConfig, Occurrence},
    record::{Algorithm, Metric, Parameter, Record, RunIdentifier},
    ExtractError,
};
use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};
use itertools::Itertools;
use regex::Regex;
use std::{
    collections::BTreeSet,
    ffi::OsStr,
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum FamilyError {
    #[error("Globs were invalid")]
    InvalidGlobs(#[from] globset::Error),
    #[error("Pattern was invalid")]
    InvalidPattern(#[from] regex::Error),
    #[error("Convention {convention} captures unknown group '{group}'")]
    UnknownGroup { convention: String, group: String },
    #[error("Convention {convention} doesn't capture '{parameter}' which is listed in columns")]
    UncapturedParameter {
        convention: String,
        parameter: Parameter,
    },
    #[error("Column '{0}' is neither a run parameter nor a metric")]
    UnknownColumn(String),
    #[error("Column '{0}' is listed more than once")]
    DuplicateColumn(String),
    #[error("Metric '{0}' is defined more than once")]
    DuplicateMetric(String),
    #[error("At least one filename convention is required")]
    NoConventions,
    #[error("At least one metric is required")]
    NoMetrics,
}

/// A single output column
#[derive(Clone, Debug, PartialEq)]
pub enum Column {
    Parameter(Parameter),
    Metric(String),
}

/// Locates `<label>:  <seconds> seconds` anywhere in a log
#[derive(Clone, Debug)]
pub struct MetricPattern {
    pub name: String,
    pub occurrence: Occurrence,
    pattern: Regex,
}

impl MetricPattern {
    pub fn load(config: &MetricConfig) -> Result<Self, FamilyError> {
        let pattern = Regex::new(&format!(
            r"{}:\s+([0-9.]+)\s+seconds",
            regex::escape(&config.label)
        ))?;

        Ok(Self {
            name: config.name.clone(),
            occurrence: config.occurrence,
            pattern,
        })
    }

    /// raw text of the authoritative value, if the label is present at all
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        match self.occurrence {
            Occurrence::First => self.pattern.captures(text),
            Occurrence::Last => self.pattern.captures_iter(text).last(),
        }
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str())
    }

    pub fn extract(&self, text: &str) -> Result<Metric, ExtractError> {
        let value = self
            .find(text)
            .ok_or_else(|| ExtractError::MissingMetric(self.name.clone()))?;

        match value.parse::<f64>() {
            Ok(seconds) => Ok(Metric {
                name: self.name.clone(),
                seconds,
            }),
            Err(_) => Err(ExtractError::MalformedMetric {
                metric: self.name.clone(),
                value: value.to_owned(),
            }),
        }
    }
}

/// Compiled form of a `FamilyConfig`
#[derive(Clone, Debug)]
pub struct Family {
    include: GlobMatcher,
    exclude: GlobSet,
    conventions: Vec<Regex>,
    metrics: Vec<MetricPattern>,
    columns: Vec<Column>,
    header: Vec<String>,
}

impl Family {
    pub fn load(config: &FamilyConfig) -> Result<Self, FamilyError> {
        let include = GlobBuilder::new(&config.include)
            .build()?
            .compile_matcher();

        let mut exclude = GlobSetBuilder::new();
        for glob in config.exclude.iter() {
            exclude.add(GlobBuilder::new(glob).build()?);
        }
        let exclude = exclude.build()?;

        if config.conventions.is_empty() {
            return Err(FamilyError::NoConventions);
        }
        if config.metrics.is_empty() {
            return Err(FamilyError::NoMetrics);
        }

        let mut conventions = Vec::with_capacity(config.conventions.len());
        let mut captured = Vec::with_capacity(config.conventions.len());

        for convention in config.conventions.iter() {
            let regex = Regex::new(convention)?;
            let mut parameters = BTreeSet::new();

            for group in regex.capture_names().flatten() {
                match group.parse::<Parameter>() {
                    Ok(parameter) => {
                        parameters.insert(parameter);
                    }
                    Err(()) => {
                        return Err(FamilyError::UnknownGroup {
                            convention: convention.clone(),
                            group: group.to_owned(),
                        })
                    }
                }
            }

            conventions.push(regex);
            captured.push(parameters);
        }

        if let Some(duplicate) = config
            .metrics
            .iter()
            .map(|metric| &metric.name)
            .duplicates()
            .next()
        {
            return Err(FamilyError::DuplicateMetric(duplicate.clone()));
        }
        let metrics = config
            .metrics
            .iter()
            .map(MetricPattern::load)
            .collect::<Result<Vec<_>, _>>()?;

        if let Some(duplicate) = config.columns.iter().duplicates().next() {
            return Err(FamilyError::DuplicateColumn(duplicate.clone()));
        }

        let mut columns = Vec::with_capacity(config.columns.len());
        for name in config.columns.iter() {
            if let Ok(parameter) = name.parse::<Parameter>() {
                // every convention has to produce the value, otherwise rows would have holes
                if let Some((convention, _)) = config
                    .conventions
                    .iter()
                    .zip(captured.iter())
                    .find(|(_, parameters)| !parameters.contains(&parameter))
                {
                    return Err(FamilyError::UncapturedParameter {
                        convention: convention.clone(),
                        parameter,
                    });
                }

                columns.push(Column::Parameter(parameter));
            } else if metrics.iter().any(|metric| &metric.name == name) {
                columns.push(Column::Metric(name.clone()));
            } else {
                return Err(FamilyError::UnknownColumn(name.clone()));
            }
        }

        Ok(Self {
            include,
            exclude,
            conventions,
            metrics,
            columns,
            header: config.columns.clone(),
        })
    }

    /// cheap prefilter on the file name, applied before any convention is tried
    pub fn accepts(&self, file_name: &str) -> bool {
        self.include.is_match(file_name) && !self.exclude.is_match(file_name)
    }

    /// decode run parameters from the first convention that matches
    pub fn decode_name(&self, file_name: &str) -> Result<RunIdentifier, ExtractError> {
        let captures = self
            .conventions
            .iter()
            .find_map(|convention| convention.captures(file_name))
            .ok_or(ExtractError::UnexpectedName)?;

        let mut id = RunIdentifier::default();

        for parameter in Parameter::ALL {
            let value = match captures.name(parameter.name()) {
                Some(value) => value.as_str(),
                None => continue,
            };
            let invalid = || ExtractError::InvalidParameter {
                parameter,
                value: value.to_owned(),
            };

            match parameter {
                Parameter::Nodes => id.nodes = Some(value.parse().map_err(|_| invalid())?),
                Parameter::Cores => id.cores = Some(value.parse().map_err(|_| invalid())?),
                Parameter::K => id.k = Some(value.parse().map_err(|_| invalid())?),
                Parameter::Repetition => {
                    id.repetition = Some(value.parse().map_err(|_| invalid())?)
                }
                Parameter::Algorithm => {
                    id.algorithm = Some(Algorithm::new(value.parse().map_err(|_| invalid())?))
                }
                Parameter::Eps => id.eps = Some(value.parse().map_err(|_| invalid())?),
            }
        }

        Ok(id)
    }

    /// all metrics or nothing, partial records are never produced
    pub fn extract_metrics(&self, text: &str) -> Result<Vec<Metric>, ExtractError> {
        self.metrics
            .iter()
            .map(|metric| metric.extract(text))
            .collect()
    }

    /// extract a record from an in-memory log, `file_name` carries the run parameters
    pub fn extract_text(&self, file_name: &str, text: &str) -> Result<Record, ExtractError> {
        let id = self.decode_name(file_name)?;
        let metrics = self.extract_metrics(text)?;

        Ok(Record {
            path: PathBuf::from(file_name),
            id,
            metrics,
        })
    }

    pub fn extract_file(&self, path: &Path) -> Result<Record, ExtractError> {
        let file_name = path
            .file_name()
            .and_then(OsStr::to_str)
            .ok_or(ExtractError::UnexpectedName)?;
        // decode first, there is no point in reading logs of unknown runs
        let id = self.decode_name(file_name)?;

        debug!(path = ?path, "Reading log");
        let text = fs::read_to_string(path)?;
        let metrics = self.extract_metrics(&text)?;

        Ok(Record {
            path: path.to_path_buf(),
            id,
            metrics,
        })
    }

    pub fn metrics(&self) -> &[MetricPattern] {
        &self.metrics
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// render a record in column order
    pub fn row(&self, record: &Record) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column {
                Column::Parameter(parameter) => record.id.value(*parameter),
                Column::Metric(name) => record.metric(name).map(|seconds| seconds.to_string()),
            })
            .map(Option::unwrap_or_default)
            .collect()
    }
}
