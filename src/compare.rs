use std::collections::HashMap;
use std::path::Path;

use log::{debug, info};

use crate::comparator::{CompareMode, Comparator};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::hasher::ContentDigest;
use crate::scanner::Scanner;
use crate::scheduler::{Job, ProgressObserver, WorkPool};
use crate::{ComparisonOutcome, FileRecord, Tristate};

/// Results of comparing two trees by relative path
#[derive(Debug, Default)]
pub struct ComparisonReport {
    /// Sorted by relative key. Identical files are left out unless requested.
    pub outcomes: Vec<ComparisonOutcome>,
    pub files_a: usize,
    pub files_b: usize,
    pub only_in_a: usize,
    pub only_in_b: usize,
    pub common: usize,
    pub size_mismatches: usize,
    /// Content comparisons actually scheduled
    pub content_checks: usize,
    pub same_content: usize,
    pub different_content: usize,
    pub unknown_content: usize,
}

impl ComparisonReport {
    /// Files present on both sides whose size or content differs
    pub fn different(&self) -> usize {
        self.size_mismatches + self.different_content
    }
}

/// Compares two directory trees file by file
pub struct TreeComparator<'a, D: ContentDigest + ?Sized> {
    config: &'a EngineConfig,
    pool: &'a WorkPool,
    comparator: Comparator<'a, D>,
    include_identical: bool,
}

impl<'a, D: ContentDigest + ?Sized> TreeComparator<'a, D> {
    pub fn new(
        config: &'a EngineConfig,
        pool: &'a WorkPool,
        digester: &'a D,
        mode: CompareMode,
    ) -> Self {
        Self {
            config,
            pool,
            comparator: Comparator::new(mode, config.chunk_size, digester),
            include_identical: false,
        }
    }

    /// Keep identical files in [`ComparisonReport::outcomes`].
    pub fn include_identical(mut self, include: bool) -> Self {
        self.include_identical = include;
        self
    }

    pub fn mode(&self) -> CompareMode {
        self.comparator.mode()
    }

    /// Scan both roots concurrently and compare them.
    pub fn compare(
        &self,
        root_a: &Path,
        root_b: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<ComparisonReport, EngineError> {
        info!("Scanning folders...");
        let scanner = Scanner::new(&self.config.exclusions);
        let (files_a, files_b) = rayon::join(|| scanner.scan(root_a), || scanner.scan(root_b));
        let (files_a, files_b) = (files_a?, files_b?);

        info!("  Folder 1: {} files", files_a.len());
        info!("  Folder 2: {} files", files_b.len());

        Ok(self.compare_records(files_a, files_b, observer))
    }

    /// Compare two already scanned record sets.
    pub fn compare_records(
        &self,
        files_a: Vec<FileRecord>,
        files_b: Vec<FileRecord>,
        observer: &dyn ProgressObserver,
    ) -> ComparisonReport {
        let mut report = ComparisonReport {
            files_a: files_a.len(),
            files_b: files_b.len(),
            ..Default::default()
        };

        let mut by_key_b: HashMap<String, FileRecord> = files_b
            .into_iter()
            .map(|r| (r.relative().to_string(), r))
            .collect();

        let mut outcomes = Vec::with_capacity(report.files_a.max(report.files_b));
        let mut pairs = Vec::new();

        for record_a in files_a {
            match by_key_b.remove(record_a.relative()) {
                Some(record_b) => {
                    report.common += 1;
                    if record_a.size() != record_b.size() {
                        report.size_mismatches += 1;
                        outcomes.push(ComparisonOutcome::size_mismatch(record_a.relative()));
                    } else {
                        pairs.push((record_a, record_b));
                    }
                }
                None => {
                    report.only_in_a += 1;
                    outcomes.push(ComparisonOutcome::only_in_a(record_a.relative()));
                }
            }
        }

        report.only_in_b = by_key_b.len();
        outcomes.extend(by_key_b.into_keys().map(ComparisonOutcome::only_in_b));

        report.content_checks = pairs.len();
        info!("Comparing {} common files...", report.common);

        let comparator = &self.comparator;
        let jobs: Vec<_> = pairs
            .into_iter()
            .map(|(a, b)| {
                let key = a.relative().to_string();
                Job::new(key, move || comparator.compare(a.path(), b.path()))
            })
            .collect();

        for completed in self.pool.run_all(jobs, observer) {
            let verdict = completed.outcome.unwrap_or_else(|err| {
                debug!("{}: {}", completed.key, err);
                Tristate::Unknown
            });
            match verdict {
                Tristate::True => report.same_content += 1,
                Tristate::False => report.different_content += 1,
                Tristate::Unknown => report.unknown_content += 1,
            }
            outcomes.push(ComparisonOutcome::compared(completed.key, verdict));
        }

        if !self.include_identical {
            outcomes.retain(|o| !o.is_identical());
        }
        outcomes.sort_by(|a, b| a.relative().cmp(b.relative()));
        report.outcomes = outcomes;
        report
    }
}
