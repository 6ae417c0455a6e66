use serde::{Deserialize, Serialize};
use std::{fmt, path::PathBuf, str::FromStr};

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FamilyConfig {
    // cheap filename check applied before any regex is tried
    pub include: String,
    #[serde(default)]
    pub exclude: Vec<String>,
    // filename conventions, tried in order (primary first, then fallbacks)
    pub conventions: Vec<String>,
    pub metrics: Vec<MetricConfig>,
    // output columns, either a run parameter name or a metric name
    pub columns: Vec<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MetricConfig {
    pub name: String,
    // literal log label preceding `:  <seconds> seconds`
    pub label: String,
    #[serde(default)]
    pub occurrence: Occurrence,
}

/// Which match is authoritative when a label shows up more than once
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Occurrence {
    /// final summary lines, only the first one counts
    #[default]
    First,
    /// cumulative "time until now" progress lines, the final one counts
    Last,
}

/// Built-in families for the experiment logs of the Actor IMM runs
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Preset {
    /// `log_k<k>_<a>D_r<r>.txt`, total time per seed set size
    TotalByK,
    /// `log_k<k>_<a>D_e<eps>_r<r>.txt`, total time per epsilon
    TotalByEps,
    /// `log_<n>n_<c>c_<a>D_r<r>.txt`, total and phase times per core count
    PhasesByCores,
    /// 2D logs only, cumulative matrix generation and k loop times
    KloopsMatrixgen,
}

const TOTAL_TIME: &str = "Total Time";

fn metric(name: &str, label: &str, occurrence: Occurrence) -> MetricConfig {
    MetricConfig {
        name: name.to_owned(),
        label: label.to_owned(),
        occurrence,
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

impl Preset {
    pub const ALL: [Preset; 4] = [
        Self::TotalByK,
        Self::TotalByEps,
        Self::PhasesByCores,
        Self::KloopsMatrixgen,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TotalByK => "total-by-k",
            Self::TotalByEps => "total-by-eps",
            Self::PhasesByCores => "phases-by-cores",
            Self::KloopsMatrixgen => "kloops-matrixgen",
        }
    }

    /// table written when no output path was configured
    pub fn default_output(&self) -> PathBuf {
        PathBuf::from(match self {
            Self::TotalByK => "results_parsed.csv",
            Self::TotalByEps => "results_eps_parsed.csv",
            Self::PhasesByCores => "results.csv",
            Self::KloopsMatrixgen => "matrix_kloops_times.csv",
        })
    }

    pub fn family(&self) -> FamilyConfig {
        match self {
            Self::TotalByK => FamilyConfig {
                include: "log_k*.txt".to_owned(),
                exclude: Vec::new(),
                conventions: strings(&[
                    r"^log_k(?P<k>\d+)_(?P<algorithm>\d+)D_r(?P<repetition>\d+)\.txt$",
                    r"^log_k(?P<k>\d+)_(?P<algorithm>\d)D_r(?P<repetition>\d+)\.txt$",
                ]),
                metrics: vec![metric("total time", TOTAL_TIME, Occurrence::First)],
                columns: strings(&["repetition", "algorithm", "k", "total time"]),
            },
            Self::TotalByEps => FamilyConfig {
                include: "log_k*.txt".to_owned(),
                exclude: Vec::new(),
                conventions: strings(&[
                    r"^log_k(?P<k>\d+)_(?P<algorithm>\d)D_e(?P<eps>[0-9.]+)_r(?P<repetition>\d+)\.txt$",
                ]),
                metrics: vec![metric("total time", TOTAL_TIME, Occurrence::First)],
                columns: strings(&["algorithm", "eps", "total time"]),
            },
            Self::PhasesByCores => FamilyConfig {
                include: "*.txt".to_owned(),
                // per-run `time_*` side files share the directory
                exclude: strings(&["*time*"]),
                conventions: strings(&[
                    r"^log_(?P<nodes>\d+)n_(?P<cores>\d+)c_(?P<algorithm>\d)D_r(?P<repetition>\d+)\.txt$",
                ]),
                metrics: vec![
                    metric("total time", TOTAL_TIME, Occurrence::First),
                    metric(
                        "generateRR time",
                        "Total Time(generateRR)",
                        Occurrence::First,
                    ),
                    metric(
                        "selectseeds time",
                        "Total Time(selectseeds)",
                        Occurrence::First,
                    ),
                ],
                columns: strings(&[
                    "nodes",
                    "cores",
                    "repetition",
                    "algorithm",
                    "total time",
                    "generateRR time",
                    "selectseeds time",
                ]),
            },
            Self::KloopsMatrixgen => FamilyConfig {
                include: "log_*2D*.txt".to_owned(),
                exclude: Vec::new(),
                conventions: strings(&[
                    r"^log_(?P<nodes>\d+)n_(?P<cores>\d+)c_2D_r(?P<repetition>\d+)\.txt$",
                ]),
                metrics: vec![
                    metric(
                        "kloops_time",
                        "[Time until now] in k loops",
                        Occurrence::Last,
                    ),
                    metric(
                        "matrixGen_time",
                        "[Time until now] in matrixGen",
                        Occurrence::Last,
                    ),
                ],
                columns: strings(&[
                    "nodes",
                    "cores",
                    "repetition",
                    "kloops_time",
                    "matrixGen_time",
                ]),
            },
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|preset| preset.name() == name)
            .ok_or_else(|| {
                format!(
                    "unknown preset '{name}', expected one of: {}",
                    Self::ALL.map(|preset| preset.name()).join(", ")
                )
            })
    }
}
