use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::hasher::ContentDigest;
use crate::scanner::Scanner;
use crate::scheduler::{Job, ProgressObserver, WorkPool};
use crate::{Digest, DuplicateGroup, FileRecord};

/// Results of a duplicate search in one tree
#[derive(Debug, Default)]
pub struct DuplicateReport {
    /// Largest files first
    pub groups: Vec<DuplicateGroup>,
    pub total_files: usize,
    /// Files left after the minimum-size filter
    pub considered: usize,
    /// Files skipped because no other file has their size
    pub unique_by_size: usize,
    /// Files that were fingerprinted
    pub candidates: usize,
    /// Fingerprint jobs that failed
    pub errors: usize,
}

impl DuplicateReport {
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn files_in_groups(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::count).sum()
    }

    /// Bytes held by all copies beyond the first in each group
    pub fn wasted_space(&self) -> u64 {
        self.groups.iter().map(DuplicateGroup::wasted_space).sum()
    }
}

/// Split records into those sharing their size with another record and the
/// number of records whose size is unique.
///
/// Unique-size files cannot have a duplicate, so they are never fingerprinted.
pub fn size_candidates(records: Vec<FileRecord>) -> (Vec<FileRecord>, usize) {
    let mut by_size: HashMap<u64, Vec<FileRecord>> = HashMap::new();
    for record in records {
        by_size.entry(record.size()).or_default().push(record);
    }

    let mut unique = 0;
    let mut candidates = Vec::new();
    for bucket in by_size.into_values() {
        if bucket.len() > 1 {
            candidates.extend(bucket);
        } else {
            unique += bucket.len();
        }
    }
    (candidates, unique)
}

/// Bucket fingerprinted records by (size, digest) and keep buckets of two or more.
pub fn group_by_digest<I>(hashed: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = (FileRecord, Digest)>,
{
    let mut buckets: HashMap<(u64, Digest), Vec<FileRecord>> = HashMap::new();
    for (record, digest) in hashed {
        buckets
            .entry((record.size(), digest))
            .or_default()
            .push(record);
    }

    let mut groups: Vec<DuplicateGroup> = buckets
        .into_iter()
        .filter_map(|((size, digest), members)| DuplicateGroup::new(digest, size, members))
        .collect();

    groups.sort_by(|a, b| b.size().cmp(&a.size()).then_with(|| a.digest().cmp(b.digest())));
    groups
}

/// Finds groups of files with identical content under one root
pub struct DuplicateFinder<'a, D: ContentDigest + ?Sized> {
    config: &'a EngineConfig,
    pool: &'a WorkPool,
    digester: &'a D,
}

impl<'a, D: ContentDigest + ?Sized> DuplicateFinder<'a, D> {
    pub fn new(config: &'a EngineConfig, pool: &'a WorkPool, digester: &'a D) -> Self {
        Self {
            config,
            pool,
            digester,
        }
    }

    /// Scan `root` and find its duplicate groups.
    pub fn find(
        &self,
        root: &Path,
        observer: &dyn ProgressObserver,
    ) -> Result<DuplicateReport, EngineError> {
        info!("Scanning folder: {}", root.display());
        let records = Scanner::new(&self.config.exclusions).scan(root)?;
        Ok(self.find_in(records, observer))
    }

    /// Find duplicate groups among already scanned records.
    pub fn find_in(
        &self,
        records: Vec<FileRecord>,
        observer: &dyn ProgressObserver,
    ) -> DuplicateReport {
        let total_files = records.len();

        let min_size = self.config.min_size;
        let records: Vec<FileRecord> = if min_size > 0 {
            let kept: Vec<_> = records.into_iter().filter(|r| r.size() >= min_size).collect();
            info!("  {} files >= {} bytes", kept.len(), min_size);
            kept
        } else {
            records
        };
        let considered = records.len();

        let (candidates, unique_by_size) = size_candidates(records);
        info!("  {} files unique by size (skipping checksum)", unique_by_size);
        info!("  {} files to checksum...", candidates.len());

        let mut report = DuplicateReport {
            total_files,
            considered,
            unique_by_size,
            candidates: candidates.len(),
            ..Default::default()
        };
        if candidates.is_empty() {
            return report;
        }

        let digester = self.digester;
        let jobs: Vec<_> = candidates
            .into_iter()
            .map(|record| {
                let path = record.path().to_path_buf();
                Job::new(record, move || digester.digest(&path))
            })
            .collect();

        let mut hashed = Vec::with_capacity(jobs.len());
        for completed in self.pool.run_all(jobs, observer) {
            match completed.outcome {
                Ok(Ok(digest)) => hashed.push((completed.key, digest)),
                Ok(Err(failure)) => {
                    debug!("{}", failure);
                    report.errors += 1;
                }
                Err(err) => {
                    debug!("{}: {}", completed.key.path().display(), err);
                    report.errors += 1;
                }
            }
        }

        if report.errors > 0 {
            warn!("  {} files could not be read", report.errors);
        }

        report.groups = group_by_digest(hashed);
        report
    }
}
