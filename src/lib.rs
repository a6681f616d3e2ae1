pub mod comparator;
pub mod compare;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod hasher;
pub mod logging;
pub mod progress;
pub mod report;
pub mod scanner;
pub mod scheduler;
pub mod utils;

use std::fmt;
use std::path::{Path, PathBuf};

pub use comparator::{compare_content, CompareMode};
pub use compare::{ComparisonReport, TreeComparator};
pub use config::{EngineConfig, ExclusionRules};
pub use duplicates::{DuplicateFinder, DuplicateReport};
pub use error::{EngineError, JobError, ReadFailure, ReportError};
pub use hasher::{ContentDigest, Fingerprinter};
pub use scanner::Scanner;
pub use scheduler::{ProgressObserver, WorkPool};

/// A regular file found under a scan root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    path: PathBuf,
    relative: String,
    size: u64,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, relative: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            relative: relative.into(),
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the scan root, '/'-separated.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

/// BLAKE3 digest of a file's full content.
///
/// Two files with equal digests are treated as having equal content; no byte
/// comparison is made to confirm it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; blake3::OUT_LEN]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; blake3::OUT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl From<blake3::Hash> for Digest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// A yes/no answer that may not have been determined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tristate {
    True,
    False,
    Unknown,
}

impl Tristate {
    pub fn is_true(self) -> bool {
        self == Tristate::True
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            Tristate::True => Some(true),
            Tristate::False => Some(false),
            Tristate::Unknown => None,
        }
    }
}

impl From<bool> for Tristate {
    fn from(value: bool) -> Self {
        if value {
            Tristate::True
        } else {
            Tristate::False
        }
    }
}

impl From<Option<bool>> for Tristate {
    fn from(value: Option<bool>) -> Self {
        value.map_or(Tristate::Unknown, Tristate::from)
    }
}

/// Verdict for one relative key across two trees.
///
/// Only the constructors below exist, so an outcome can never claim a size or
/// content answer for a file missing on one side, nor a content answer for
/// files whose sizes differ.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonOutcome {
    relative: String,
    in_a: bool,
    in_b: bool,
    size_equal: Tristate,
    content_equal: Tristate,
}

impl ComparisonOutcome {
    pub fn only_in_a(relative: impl Into<String>) -> Self {
        Self::missing(relative, true, false)
    }

    pub fn only_in_b(relative: impl Into<String>) -> Self {
        Self::missing(relative, false, true)
    }

    fn missing(relative: impl Into<String>, in_a: bool, in_b: bool) -> Self {
        Self {
            relative: relative.into(),
            in_a,
            in_b,
            size_equal: Tristate::Unknown,
            content_equal: Tristate::Unknown,
        }
    }

    /// Present on both sides with different sizes; content is never read.
    pub fn size_mismatch(relative: impl Into<String>) -> Self {
        Self {
            relative: relative.into(),
            in_a: true,
            in_b: true,
            size_equal: Tristate::False,
            content_equal: Tristate::Unknown,
        }
    }

    /// Present on both sides with equal sizes and a content verdict.
    pub fn compared(relative: impl Into<String>, content_equal: Tristate) -> Self {
        Self {
            relative: relative.into(),
            in_a: true,
            in_b: true,
            size_equal: Tristate::True,
            content_equal,
        }
    }

    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn in_a(&self) -> bool {
        self.in_a
    }

    pub fn in_b(&self) -> bool {
        self.in_b
    }

    pub fn size_equal(&self) -> Tristate {
        self.size_equal
    }

    pub fn content_equal(&self) -> Tristate {
        self.content_equal
    }

    /// Present on both sides with equal size and equal content.
    pub fn is_identical(&self) -> bool {
        self.in_a && self.in_b && self.size_equal.is_true() && self.content_equal.is_true()
    }
}

/// Two or more files sharing both size and digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateGroup {
    digest: Digest,
    size: u64,
    members: Vec<FileRecord>,
}

impl DuplicateGroup {
    /// Build a group from records that share `size` and `digest`.
    ///
    /// Returns `None` for fewer than two members. Members are sorted by path.
    pub fn new(digest: Digest, size: u64, mut members: Vec<FileRecord>) -> Option<Self> {
        if members.len() < 2 {
            return None;
        }
        debug_assert!(members.iter().all(|m| m.size() == size));
        members.sort_by(|a, b| a.path().cmp(b.path()));
        Some(Self {
            digest,
            size,
            members,
        })
    }

    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn members(&self) -> &[FileRecord] {
        &self.members
    }

    pub fn count(&self) -> usize {
        self.members.len()
    }

    /// Bytes that could be reclaimed by keeping a single copy
    pub fn wasted_space(&self) -> u64 {
        self.size * (self.members.len() as u64 - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord::new(PathBuf::from(path), path.trim_start_matches('/'), size)
    }

    #[test]
    fn test_group_rejects_singletons() {
        let digest = Digest::from(blake3::hash(b"x"));
        assert!(DuplicateGroup::new(digest, 1, vec![record("/a", 1)]).is_none());
        assert!(DuplicateGroup::new(digest, 1, Vec::new()).is_none());
    }

    #[test]
    fn test_group_sorts_members_and_counts_waste() {
        let digest = Digest::from(blake3::hash(b"hello"));
        let group = DuplicateGroup::new(
            digest,
            5,
            vec![record("/c", 5), record("/a", 5), record("/b", 5)],
        )
        .unwrap();

        let paths: Vec<_> = group.members().iter().map(|m| m.relative()).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
        assert_eq!(group.count(), 3);
        assert_eq!(group.wasted_space(), 10);
    }

    #[test]
    fn test_outcome_invariants() {
        let only_a = ComparisonOutcome::only_in_a("x");
        assert!(only_a.in_a() && !only_a.in_b());
        assert_eq!(only_a.size_equal(), Tristate::Unknown);
        assert_eq!(only_a.content_equal(), Tristate::Unknown);

        let mismatch = ComparisonOutcome::size_mismatch("x");
        assert_eq!(mismatch.size_equal(), Tristate::False);
        assert_eq!(mismatch.content_equal(), Tristate::Unknown);
        assert!(!mismatch.is_identical());

        let same = ComparisonOutcome::compared("x", Tristate::True);
        assert!(same.is_identical());
        assert!(!ComparisonOutcome::compared("x", Tristate::Unknown).is_identical());
    }

    #[test]
    fn test_digest_hex() {
        let digest = Digest::from(blake3::hash(b""));
        assert_eq!(digest.to_hex().len(), 64);
        assert_eq!(digest.to_string(), digest.to_hex());
        assert_eq!(digest.to_hex(), blake3::hash(b"").to_hex().to_string());
    }

    #[test]
    fn test_tristate_conversions() {
        assert_eq!(Tristate::from(true), Tristate::True);
        assert_eq!(Tristate::from(None), Tristate::Unknown);
        assert_eq!(Tristate::False.as_option(), Some(false));
        assert_eq!(Tristate::Unknown.as_option(), None);
    }
}
