use std::collections::HashSet;

use crate::error::EngineError;

/// Default read chunk: 1 MiB amortizes syscall overhead on large files.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;
pub const DEFAULT_WORKERS: usize = 8;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 500;

/// File names that never take part in a scan (macOS metadata files by default)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionRules {
    names: HashSet<String>,
    prefixes: Vec<String>,
}

impl ExclusionRules {
    pub fn new<N, P>(names: N, prefixes: P) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// Excludes nothing.
    pub fn none() -> Self {
        Self {
            names: HashSet::new(),
            prefixes: Vec::new(),
        }
    }

    /// Case-sensitive match against the exact names and the prefix list
    pub fn is_excluded(&self, file_name: &str) -> bool {
        self.names.contains(file_name)
            || self
                .prefixes
                .iter()
                .any(|prefix| file_name.starts_with(prefix.as_str()))
    }
}

impl Default for ExclusionRules {
    fn default() -> Self {
        Self::new([".DS_Store"], ["._"])
    }
}

/// Settings shared by every stage of a run.
///
/// Built once at startup and handed to each component by reference.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub exclusions: ExclusionRules,
    pub chunk_size: usize,
    pub workers: usize,
    pub progress_interval: usize,
    pub min_size: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exclusions: ExclusionRules::default(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            workers: DEFAULT_WORKERS,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            min_size: 0,
        }
    }
}

impl EngineConfig {
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_min_size(mut self, min_size: u64) -> Self {
        self.min_size = min_size;
        self
    }

    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    pub fn with_exclusions(mut self, exclusions: ExclusionRules) -> Self {
        self.exclusions = exclusions;
        self
    }

    /// Reject values no stage can work with.
    pub fn validate(&self) -> Result<(), EngineError> {
        if self.workers == 0 {
            return Err(EngineError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(EngineError::InvalidConfig(
                "chunk size must be at least 1 byte".to_string(),
            ));
        }
        if self.progress_interval == 0 {
            return Err(EngineError::InvalidConfig(
                "progress interval must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
