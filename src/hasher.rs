use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use blake3::Hasher;
use log::trace;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::error::ReadFailure;
use crate::Digest;

/// Anything that can fingerprint a file's content.
///
/// Implementations must be deterministic: the same bytes always give the same
/// digest.
pub trait ContentDigest: Send + Sync {
    fn digest(&self, path: &Path) -> Result<Digest, ReadFailure>;
}

/// Streams a file through BLAKE3 in fixed-size chunks.
///
/// Equal digests are taken to mean equal content. BLAKE3 collisions are not a
/// practical concern, so no byte-by-byte confirmation follows a match.
#[derive(Debug, Clone)]
pub struct Fingerprinter {
    chunk_size: usize,
}

impl Fingerprinter {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn hash_file(&self, path: &Path) -> io::Result<Digest> {
        let mut file = File::open(path)?;
        let mut hasher = Hasher::new();
        let mut buffer = vec![0; self.chunk_size];

        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Digest::from(hasher.finalize()))
    }
}

impl Default for Fingerprinter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

impl ContentDigest for Fingerprinter {
    fn digest(&self, path: &Path) -> Result<Digest, ReadFailure> {
        let digest = self
            .hash_file(path)
            .map_err(|e| ReadFailure::new(path, e))?;
        trace!("{} {}", digest, path.display());
        Ok(digest)
    }
}
