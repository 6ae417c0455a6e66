use crate::{
    config::{ConfigErrors, ExtractJob, RunnerConfig},
    parse_only, Cli, Command,
};
use clap::Parser;
use immbench_ingest::{Occurrence, Preset};
use std::path::PathBuf;

const CONFIG: &str = r#"
extract:
  fig8:
    preset: total-by-k
  custom:
    input: logs
    output: custom.csv
    parallel: true
    family:
      include: "log_*.txt"
      conventions: ['^log_(?P<nodes>\d+)n_(?P<cores>\d+)c_(?P<algorithm>\d)D_r(?P<repetition>\d+)\.txt$']
      metrics:
        - { name: total time, label: Total Time }
        - { name: matrix, label: "[Time until now] in matrixGen", occurrence: last }
      columns: [nodes, cores, algorithm, repetition, total time, matrix]
summarize:
  fig8:
    input: results_parsed.csv
    output: fig8_summary.csv
    group_by: [k, algorithm]
    values: [total time]
    only: { algorithm: [1D, 2D] }
"#;

fn config() -> RunnerConfig {
    serde_yaml::from_str(CONFIG).unwrap()
}

#[test]
pub fn parse_config() {
    let config = config();

    let fig8 = &config.extract["fig8"];
    assert_eq!(fig8.preset, Some(Preset::TotalByK));
    assert_eq!(fig8.input, PathBuf::from("results"));
    assert_eq!(fig8.output_path(), Some(PathBuf::from("results_parsed.csv")));

    let custom = &config.extract["custom"];
    assert!(custom.parallel);
    let family = custom.family.as_ref().unwrap();
    assert_eq!(family.metrics[0].occurrence, Occurrence::First);
    assert_eq!(family.metrics[1].occurrence, Occurrence::Last);

    let summary = &config.summarize["fig8"];
    assert_eq!(summary.confidence, 0.95);
    assert_eq!(summary.only["algorithm"], vec!["1D", "2D"]);

    assert!(!config.preflight_checks());
}

#[test]
pub fn unknown_fields_are_rejected() {
    let result = serde_yaml::from_str::<RunnerConfig>(
        "extract:\n  a:\n    preset: total-by-k\n    glob: '*'\n",
    );

    assert!(result.is_err());
}

#[test]
pub fn preset_and_family_are_exclusive() {
    let mut config = config();
    let family = config.extract["custom"].family.clone();
    config.extract.get_mut("fig8").unwrap().family = family;

    assert!(config.preflight_checks());
}

#[test]
pub fn custom_family_needs_output() {
    let mut config = config();
    config.extract.get_mut("custom").unwrap().output = None;

    assert!(config.preflight_checks());
}

#[test]
pub fn invalid_family_fails_preflight() {
    let mut config = config();
    let family = config
        .extract
        .get_mut("custom")
        .unwrap()
        .family
        .as_mut()
        .unwrap();
    family.columns.push("memory".to_owned());

    assert!(config.preflight_checks());
}

#[test]
pub fn colliding_outputs_fail_preflight() {
    let mut config = config();
    config.extract.insert(
        "again".to_owned(),
        ExtractJob::from_preset(Preset::TotalByK, PathBuf::from("other"), None),
    );

    assert!(config.preflight_checks());
}

#[test]
pub fn empty_config_fails_preflight() {
    assert!(RunnerConfig::default().preflight_checks());
}

#[test]
pub fn select_jobs() {
    let mut config = config();
    config.select(&["custom".to_owned()]).unwrap();

    assert_eq!(config.extract.keys().collect::<Vec<_>>(), ["custom"]);
    assert!(config.summarize.is_empty());

    assert!(matches!(
        config.select(&["fig13".to_owned()]),
        Err(ConfigErrors::UnknownJob(job)) if job == "fig13"
    ));
}

#[test]
pub fn only_filter_argument() {
    assert_eq!(
        parse_only("algorithm=1D,2D"),
        Ok((
            "algorithm".to_owned(),
            vec!["1D".to_owned(), "2D".to_owned()]
        ))
    );
    assert!(parse_only("algorithm").is_err());
    assert!(parse_only("=1D").is_err());
}

#[test]
pub fn extract_command_builds_a_single_job() {
    let cli = Cli::try_parse_from(["immbench", "extract", "--preset", "total-by-eps"]).unwrap();
    let config = cli.command.into_config().unwrap();

    let job = &config.extract["total-by-eps"];
    assert_eq!(job.input, PathBuf::from("results"));
    assert_eq!(
        job.output_path(),
        Some(PathBuf::from("results_eps_parsed.csv"))
    );
    assert!(config.summarize.is_empty());
}

#[test]
pub fn summarize_command() {
    let cli = Cli::try_parse_from([
        "immbench",
        "-v",
        "summarize",
        "--input",
        "results.csv",
        "--output",
        "summary.csv",
        "--group-by",
        "cores,algorithm",
        "--value",
        "total time",
        "--only",
        "algorithm=1D,2D",
    ])
    .unwrap();
    assert_eq!(cli.verbose, 1);

    match cli.command {
        Command::Summarize {
            group_by,
            values,
            only,
            confidence,
            ..
        } => {
            assert_eq!(group_by, ["cores", "algorithm"]);
            assert_eq!(values, ["total time"]);
            assert_eq!(only.len(), 1);
            assert_eq!(confidence, 0.95);
        }
        other => panic!("expected summarize, got {other:?}"),
    }
}

#[test]
pub fn unknown_preset_is_rejected() {
    assert!(Cli::try_parse_from(["immbench", "extract", "--preset", "fig8"]).is_err());
}
