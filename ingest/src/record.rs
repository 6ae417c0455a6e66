use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

/// Run parameters that a filename convention may encode as named capture groups
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Parameter {
    Nodes,
    Cores,
    K,
    Algorithm,
    Repetition,
    Eps,
}

impl Parameter {
    pub const ALL: [Parameter; 6] = [
        Self::Nodes,
        Self::Cores,
        Self::K,
        Self::Algorithm,
        Self::Repetition,
        Self::Eps,
    ];

    /// capture group and column name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Nodes => "nodes",
            Self::Cores => "cores",
            Self::K => "k",
            Self::Algorithm => "algorithm",
            Self::Repetition => "repetition",
            Self::Eps => "eps",
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|parameter| parameter.name() == name)
            .ok_or(())
    }
}

/// Algorithm variant label, e.g., `1D` or `2D`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Algorithm {
    pub dimensions: u32,
}

impl Algorithm {
    pub fn new(dimensions: u32) -> Self {
        Self { dimensions }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}D", self.dimensions)
    }
}

/// Parameters decoded from a single log filename
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunIdentifier {
    pub nodes: Option<u64>,
    pub cores: Option<u64>,
    pub k: Option<u64>,
    pub algorithm: Option<Algorithm>,
    pub repetition: Option<u64>,
    pub eps: Option<f64>,
}

impl RunIdentifier {
    /// render a decoded parameter as a table cell, `None` if the convention didn't capture it
    pub fn value(&self, parameter: Parameter) -> Option<String> {
        match parameter {
            Parameter::Nodes => self.nodes.map(|value| value.to_string()),
            Parameter::Cores => self.cores.map(|value| value.to_string()),
            Parameter::K => self.k.map(|value| value.to_string()),
            Parameter::Algorithm => self.algorithm.map(|value| value.to_string()),
            Parameter::Repetition => self.repetition.map(|value| value.to_string()),
            Parameter::Eps => self.eps.map(|value| value.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    pub name: String,
    pub seconds: f64,
}

/// One successfully decoded log file
/// metrics are stored in the order the family declares them
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub path: PathBuf,
    pub id: RunIdentifier,
    pub metrics: Vec<Metric>,
}

impl Record {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|metric| metric.name == name)
            .map(|metric| metric.seconds)
    }
}
