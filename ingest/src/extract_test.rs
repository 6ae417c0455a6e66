use crate::{
    config::Preset,
    extract::Extractor,
    family::Family,
    record::Algorithm,
    table::write_table,
    Diagnostic, ExtractError,
};
use std::{fs, path::Path};
use tempfile::TempDir;

fn extractor(preset: Preset) -> Extractor {
    Extractor::new(Family::load(&preset.family()).unwrap())
}

fn write_log(directory: &Path, name: &str, content: &str) {
    fs::write(directory.join(name), content).unwrap();
}

fn table(extractor: &Extractor, records: &[crate::Record]) -> String {
    let mut buffer = Vec::new();
    write_table(extractor.family(), records, &mut buffer).unwrap();

    String::from_utf8(buffer).unwrap()
}

#[test]
pub fn single_eps_log_end_to_end() {
    let directory = TempDir::new().unwrap();
    write_log(
        directory.path(),
        "log_k50_1D_e0.1_r1.txt",
        "init\n...Total Time: 3.25 seconds...\n",
    );

    let extractor = extractor(Preset::TotalByEps);
    let extraction = extractor.extract(directory.path());

    assert!(extraction.diagnostics.is_empty());
    assert_eq!(
        table(&extractor, &extraction.records),
        "algorithm,eps,total time\n1D,0.1,3.25\n"
    );
}

#[test]
pub fn missing_directory_yields_header_only() {
    let directory = TempDir::new().unwrap();
    let extractor = extractor(Preset::TotalByK);
    let extraction = extractor.extract(&directory.path().join("results"));

    assert!(extraction.records.is_empty());
    assert!(extraction.missing_directory());
    assert_eq!(
        table(&extractor, &extraction.records),
        "repetition,algorithm,k,total time\n"
    );
}

#[test]
pub fn unexpected_names_are_reported_once_each() {
    let directory = TempDir::new().unwrap();
    let log = "Total Time: 1.0 seconds\n";
    write_log(directory.path(), "log_k10_1D_r1.txt", log);
    write_log(directory.path(), "log_k10_1D_r2.txt", log);
    write_log(directory.path(), "log_k10_oneD_r1.txt", log);
    write_log(directory.path(), "log_k_1D.txt", log);
    // rejected by the prefilter, not reported at all
    write_log(directory.path(), "inf_k10_1D_r1.txt", log);
    write_log(directory.path(), "time_k10_1D_r1.txt", log);

    let extraction = extractor(Preset::TotalByK).extract(directory.path());

    assert_eq!(extraction.records.len(), 2);
    assert_eq!(extraction.unexpected_names(), 2);
    assert_eq!(extraction.diagnostics.len(), 2);
}

#[test]
pub fn repetitions_stay_distinct() {
    let directory = TempDir::new().unwrap();
    write_log(directory.path(), "log_k10_2D_r1.txt", "Total Time: 1.0 seconds");
    write_log(directory.path(), "log_k10_2D_r2.txt", "Total Time: 2.0 seconds");

    let mut records = extractor(Preset::TotalByK)
        .extract(directory.path())
        .records;
    records.sort_by_key(|record| record.id.repetition);

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id.repetition, Some(1));
    assert_eq!(records[1].id.repetition, Some(2));
    assert!(records
        .iter()
        .all(|record| record.id.algorithm == Some(Algorithm::new(2))));
}

#[test]
pub fn missing_metric_skips_file() {
    let directory = TempDir::new().unwrap();
    write_log(directory.path(), "log_k10_1D_r1.txt", "Total Time: 1.0 seconds");
    write_log(directory.path(), "log_k10_1D_r2.txt", "crashed before the end\n");

    let extractor = extractor(Preset::TotalByK);
    let extraction = extractor.extract(directory.path());

    assert_eq!(extraction.records.len(), 1);
    assert!(matches!(
        &extraction.diagnostics[..],
        [Diagnostic::Skipped {
            reason: ExtractError::MissingMetric(_),
            path,
        }] if path.ends_with("log_k10_1D_r2.txt")
    ));
    assert_eq!(
        table(&extractor, &extraction.records),
        "repetition,algorithm,k,total time\n1,1D,10,1\n"
    );
}

#[test]
pub fn unreadable_file_skips_only_that_file() {
    let directory = TempDir::new().unwrap();
    write_log(directory.path(), "log_k10_1D_r1.txt", "Total Time: 1.0 seconds");
    fs::write(directory.path().join("log_k10_1D_r2.txt"), b"\xff\xfe\x00\x80").unwrap();

    let extraction = extractor(Preset::TotalByK).extract(directory.path());

    assert_eq!(extraction.records.len(), 1);
    assert!(matches!(
        &extraction.diagnostics[..],
        [Diagnostic::Skipped {
            reason: ExtractError::Unreadable(_),
            ..
        }]
    ));
}

#[test]
pub fn extraction_is_idempotent_and_parallel_agrees() {
    let directory = TempDir::new().unwrap();
    for cores in [1, 2, 4, 8, 16] {
        for repetition in 1..=3 {
            write_log(
                directory.path(),
                &format!("log_1n_{cores}c_2D_r{repetition}.txt"),
                &format!(
                    "[Time until now] in matrixGen: 0.5 seconds\n\
                     [Time until now] in k loops: 1.{repetition} seconds\n\
                     [Time until now] in matrixGen: {cores}.5 seconds\n\
                     [Time until now] in k loops: {cores}.{repetition} seconds\n"
                ),
            );
        }
    }
    write_log(directory.path(), "log_1n_4c_1D_r1.txt", "ignored");

    let sequential = extractor(Preset::KloopsMatrixgen);
    let parallel = extractor(Preset::KloopsMatrixgen).parallel(true);

    let sorted_rows = |extractor: &Extractor| {
        let mut rows = table(extractor, &extractor.extract(directory.path()).records)
            .lines()
            .map(str::to_owned)
            .collect::<Vec<_>>();
        rows.sort();
        rows
    };

    let first = sorted_rows(&sequential);
    assert_eq!(first.len(), 16);
    assert!(first.contains(&"1,8,2,8.2,8.5".to_owned()));
    assert_eq!(first, sorted_rows(&sequential));
    assert_eq!(first, sorted_rows(&parallel));
}

#[test]
pub fn parallel_keeps_listing_order() {
    let directory = TempDir::new().unwrap();
    for repetition in 1..=20 {
        write_log(
            directory.path(),
            &format!("log_k5_1D_r{repetition}.txt"),
            "Total Time: 1 seconds",
        );
    }

    let sequential = extractor(Preset::TotalByK).extract(directory.path());
    let parallel = extractor(Preset::TotalByK)
        .parallel(true)
        .extract(directory.path());

    assert_eq!(sequential.records, parallel.records);
}
