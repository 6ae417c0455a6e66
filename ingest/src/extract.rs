use crate::{family::Family, record::Record, Diagnostic, ExtractError};
use ignore::{DirEntry, WalkBuilder};
use itertools::{Either, Itertools};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info, instrument, trace, warn};

/// Result of scanning one directory
#[derive(Debug, Default)]
pub struct Extraction {
    /// records in directory listing order
    pub records: Vec<Record>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    /// number of files skipped because no filename convention matched
    pub fn unexpected_names(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|diagnostic| {
                matches!(
                    diagnostic,
                    Diagnostic::Skipped {
                        reason: ExtractError::UnexpectedName,
                        ..
                    }
                )
            })
            .count()
    }

    pub fn missing_directory(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|diagnostic| matches!(diagnostic, Diagnostic::DirectoryNotFound(_)))
    }
}

/// Applies a family to every file of a directory
#[derive(Clone, Debug)]
pub struct Extractor {
    family: Family,
    parallel: bool,
}

impl Extractor {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            parallel: false,
        }
    }

    /// extract files on the rayon pool, order of the results is unaffected
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn family(&self) -> &Family {
        &self.family
    }

    /// scan `directory` (non-recursive), no condition here aborts the scan
    #[instrument(skip(self), level = "info")]
    pub fn extract(&self, directory: &Path) -> Extraction {
        if !directory.is_dir() {
            error!(
                directory = ?directory,
                "Directory not found, please ensure the log files are in {directory:?}"
            );

            return Extraction {
                records: Vec::new(),
                diagnostics: vec![Diagnostic::DirectoryNotFound(directory.to_path_buf())],
            };
        }

        let paths = list_files(directory);

        let outcomes: Vec<Result<Record, Diagnostic>> = if self.parallel {
            paths
                .into_par_iter()
                .filter_map(|path| self.process(path))
                .collect()
        } else {
            paths
                .into_iter()
                .filter_map(|path| self.process(path))
                .collect()
        };

        let (records, diagnostics): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition_map(|outcome| match outcome {
                Ok(record) => Either::Left(record),
                Err(diagnostic) => Either::Right(diagnostic),
            });

        info!(
            records = records.len(),
            skipped = diagnostics.len(),
            "Done with scanning {directory:?}"
        );

        Extraction {
            records,
            diagnostics,
        }
    }

    /// `None` if the prefilter rejected the file
    fn process(&self, path: PathBuf) -> Option<Result<Record, Diagnostic>> {
        let file_name = path.file_name()?.to_string_lossy();

        if !self.family.accepts(&file_name) {
            trace!(path = ?path, "Ignored by prefilter");

            return None;
        }

        Some(
            self.family
                .extract_file(&path)
                .map_err(|reason| {
                    warn!(path = ?path, "Skipping file: {reason}");

                    Diagnostic::Skipped { path, reason }
                }),
        )
    }
}

fn list_files(directory: &Path) -> Vec<PathBuf> {
    WalkBuilder::new(directory)
        .standard_filters(false)
        .follow_links(true)
        .max_depth(Some(1))
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("Failed to list directory entry: {e}");
                None
            }
        })
        // depth 0 is the directory itself
        .filter(|entry| {
            entry.depth() > 0 && entry.file_type().map_or(false, |kind| kind.is_file())
        })
        .map(DirEntry::into_path)
        .collect_vec()
}
