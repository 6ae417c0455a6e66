//! Grouped statistics over the tables written by `immbench-ingest`

pub mod stats;


use itertools::Itertools;
use stats::Stats;
use std::{
    collections::BTreeMap,
    fmt,
    io::{Read, Write},
};
use thiserror::Error;
use tracing::{debug, instrument, warn};

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Failed to read or write table: {0}")]
    Csv(#[from] csv::Error),
    #[error("Column '{0}' not found in table")]
    MissingColumn(String),
    #[error("Confidence level {0} must lie strictly between 0 and 1")]
    InvalidConfidence(f64),
    #[error("At least one value column is required")]
    NoValues,
}

/// One component of a group key
/// integer keys order numerically and before any text key
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum KeyPart {
    Integer(i64),
    Text(String),
}

impl KeyPart {
    pub fn parse(value: &str) -> Self {
        value
            .parse()
            .map(Self::Integer)
            .unwrap_or_else(|_| Self::Text(value.to_owned()))
    }
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Group {
    pub key: Vec<KeyPart>,
    /// one entry per value column
    pub stats: Vec<Stats>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Summary {
    pub group_by: Vec<String>,
    pub values: Vec<String>,
    pub groups: Vec<Group>,
}

impl Summary {
    pub fn group(&self, key: &[&str]) -> Option<&Group> {
        let key = key.iter().map(|part| KeyPart::parse(part)).collect_vec();

        self.groups.iter().find(|group| group.key == key)
    }

    pub fn header(&self) -> Vec<String> {
        self.group_by
            .iter()
            .cloned()
            .chain(self.values.iter().flat_map(|value| {
                ["mean", "std", "count", "ci_lower", "ci_upper"]
                    .map(|statistic| format!("{statistic}_{value}"))
            }))
            .collect()
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<(), AnalysisError> {
        let mut writer = csv::Writer::from_writer(writer);
        let cell = |value: Option<f64>| value.map(|value| value.to_string()).unwrap_or_default();

        writer.write_record(self.header())?;
        for group in self.groups.iter() {
            let row = group
                .key
                .iter()
                .map(KeyPart::to_string)
                .chain(group.stats.iter().flat_map(|stats| {
                    [
                        cell(stats.mean),
                        cell(stats.std),
                        stats.count.to_string(),
                        cell(stats.ci.map(|ci| ci.lower)),
                        cell(stats.ci.map(|ci| ci.upper)),
                    ]
                }))
                .collect_vec();

            writer.write_record(row)?;
        }
        writer.flush().map_err(csv::Error::from)?;

        Ok(())
    }
}

/// Groups rows of a table and computes mean, std, count and a t-interval per value column
#[derive(Clone, Debug)]
pub struct Summarizer {
    pub group_by: Vec<String>,
    pub values: Vec<String>,
    /// keep only rows whose column holds one of the listed values
    pub only: BTreeMap<String, Vec<String>>,
    pub confidence: f64,
}

impl Summarizer {
    pub fn new(group_by: Vec<String>, values: Vec<String>) -> Self {
        Self {
            group_by,
            values,
            only: BTreeMap::new(),
            confidence: DEFAULT_CONFIDENCE,
        }
    }

    pub fn only(mut self, column: impl Into<String>, accepted: Vec<String>) -> Self {
        self.only.insert(column.into(), accepted);
        self
    }

    pub fn confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    #[instrument(skip(self, reader), level = "debug")]
    pub fn summarize<R: Read>(&self, reader: R) -> Result<Summary, AnalysisError> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(AnalysisError::InvalidConfidence(self.confidence));
        }
        if self.values.is_empty() {
            return Err(AnalysisError::NoValues);
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();
        let position = |name: &String| {
            headers
                .iter()
                .position(|header| header == name.as_str())
                .ok_or_else(|| AnalysisError::MissingColumn(name.clone()))
        };

        let keys = self
            .group_by
            .iter()
            .map(position)
            .collect::<Result<Vec<_>, _>>()?;
        let values = self
            .values
            .iter()
            .map(position)
            .collect::<Result<Vec<_>, _>>()?;
        let filters = self
            .only
            .iter()
            .map(|(column, accepted)| Ok((position(column)?, accepted)))
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        let mut samples = BTreeMap::<Vec<KeyPart>, Vec<Vec<f64>>>::new();

        for (index, row) in reader.records().enumerate() {
            let row = row?;

            if !filters.iter().all(|(position, accepted)| {
                row.get(*position)
                    .map_or(false, |value| accepted.iter().any(|accepted| accepted == value))
            }) {
                continue;
            }

            let key = keys
                .iter()
                .map(|position| KeyPart::parse(row.get(*position).unwrap_or_default()))
                .collect_vec();
            let columns = samples
                .entry(key)
                .or_insert_with(|| vec![Vec::new(); values.len()]);

            // like a NaN cell, a bad value only drops out of its own column
            for ((column, position), name) in columns
                .iter_mut()
                .zip(values.iter())
                .zip(self.values.iter())
            {
                match row.get(*position).unwrap_or_default().parse::<f64>() {
                    Ok(value) if value.is_finite() => column.push(value),
                    _ => warn!(
                        row = index + 1,
                        column = %name,
                        "Skipping empty or unparsable value"
                    ),
                }
            }
        }

        debug!(groups = samples.len(), "Grouped table");

        Ok(Summary {
            group_by: self.group_by.clone(),
            values: self.values.clone(),
            groups: samples
                .into_iter()
                .map(|(key, columns)| Group {
                    key,
                    stats: columns
                        .iter()
                        .map(|column| Stats::from_samples(column, self.confidence))
                        .collect(),
                })
                .collect(),
        })
    }
}
