use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors raised before any file work starts.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A scan root is missing, unreadable or not a directory
    #[error("{} is not a directory", path.display())]
    InvalidRoot { path: PathBuf },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// A file could not be read to the end.
///
/// Never carries a partial digest: any I/O error along the way fails the whole read.
#[derive(Debug, Error)]
#[error("failed to read {}: {source}", path.display())]
pub struct ReadFailure {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

impl ReadFailure {
    pub fn new(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            path: path.into(),
            source,
        }
    }
}

/// Why a scheduled job produced no value of its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("job panicked: {0}")]
    Panicked(String),

    #[error("job cancelled before it started")]
    Cancelled,
}

/// Errors while writing a report sink.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}
