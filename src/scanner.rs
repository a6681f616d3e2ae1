use std::borrow::Cow;
use std::ffi::OsStr;
use std::fmt::Write;
use std::path::{Component, Path, PathBuf};

use log::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::ExclusionRules;
use crate::error::EngineError;
use crate::FileRecord;

/// Walks a directory tree and records every regular file in it
pub struct Scanner<'a> {
    exclusions: &'a ExclusionRules,
}

impl<'a> Scanner<'a> {
    pub fn new(exclusions: &'a ExclusionRules) -> Self {
        Self { exclusions }
    }

    /// Collect all files under `root`.
    ///
    /// Entries that cannot be listed or stat'ed are dropped; a partial view of
    /// the tree is preferred over aborting the scan. The order of the returned
    /// records is unspecified.
    pub fn scan(&self, root: &Path) -> Result<Vec<FileRecord>, EngineError> {
        let root = validate_root(root)?;

        let walker = WalkDir::new(&root)
            .follow_links(false)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(err) => {
                    debug!("Skipping unreadable entry: {}", err);
                    None
                }
            })
            .filter(|e| e.file_type().is_file());

        let mut files = Vec::new();
        for entry in walker {
            if self.is_excluded(&entry) {
                continue;
            }
            if let Some(record) = self.make_record(&root, &entry) {
                files.push(record);
            }
        }

        info!("{} files found under {}", files.len(), root.display());
        Ok(files)
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .is_some_and(|name| self.exclusions.is_excluded(name))
    }

    fn make_record(&self, root: &Path, entry: &DirEntry) -> Option<FileRecord> {
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(err) => {
                debug!("Skipping {}: {}", entry.path().display(), err);
                return None;
            }
        };

        let relative = relative_key(root, entry.path())?;
        Some(FileRecord::new(entry.path(), relative, metadata.len()))
    }
}

/// The root must be an existing, listable directory.
fn validate_root(root: &Path) -> Result<PathBuf, EngineError> {
    let invalid = || EngineError::InvalidRoot {
        path: root.to_path_buf(),
    };

    if !root.is_dir() {
        return Err(invalid());
    }
    std::fs::read_dir(root).map_err(|_| invalid())?;
    std::path::absolute(root).map_err(|_| invalid())
}

/// Key used to match a file across two roots: its path below the root with
/// components joined by '/'.
///
/// Names that are not valid UTF-8 are escaped instead of replaced, so two
/// distinct files never share a key.
pub fn relative_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<_> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(key_part(part)),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn key_part(part: &OsStr) -> Cow<'_, str> {
    match part.to_str() {
        Some(name) if !name.contains('\\') => Cow::Borrowed(name),
        _ => Cow::Owned(escape_name(part.as_encoded_bytes())),
    }
}

/// Backslashes are doubled and bytes outside UTF-8 become `\xNN`.
fn escape_name(bytes: &[u8]) -> String {
    let mut escaped = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        escaped.push_str(&chunk.valid().replace('\\', "\\\\"));
        for byte in chunk.invalid() {
            let _ = write!(escaped, "\\x{:02x}", byte);
        }
    }
    escaped
}
