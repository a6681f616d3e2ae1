use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use log::debug;

use crate::config::DEFAULT_CHUNK_SIZE;
use crate::hasher::{ContentDigest, Fingerprinter};
use crate::Tristate;

/// How two equally sized files are checked for equal content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareMode {
    /// Read both files in lockstep and stop at the first differing chunk
    #[default]
    Bytes,
    /// Fingerprint both files and compare the digests
    Digest,
}

/// Checks pairs of files for equal content.
///
/// Callers must only pass files already known to have equal sizes.
pub struct Comparator<'a, D: ContentDigest + ?Sized> {
    mode: CompareMode,
    chunk_size: usize,
    digester: &'a D,
}

impl<'a, D: ContentDigest + ?Sized> Comparator<'a, D> {
    pub fn new(mode: CompareMode, chunk_size: usize, digester: &'a D) -> Self {
        Self {
            mode,
            chunk_size: chunk_size.max(1),
            digester,
        }
    }

    pub fn mode(&self) -> CompareMode {
        self.mode
    }

    /// `Unknown` whenever either file fails to read.
    pub fn compare(&self, a: &Path, b: &Path) -> Tristate {
        match self.mode {
            CompareMode::Bytes => compare_files(a, b, self.chunk_size),
            CompareMode::Digest => self.compare_digests(a, b),
        }
    }

    fn compare_digests(&self, a: &Path, b: &Path) -> Tristate {
        let (digest_a, digest_b) =
            rayon::join(|| self.digester.digest(a), || self.digester.digest(b));

        match (digest_a, digest_b) {
            (Ok(x), Ok(y)) => Tristate::from(x == y),
            (Err(e), _) | (_, Err(e)) => {
                debug!("{}", e);
                Tristate::Unknown
            }
        }
    }
}

/// Compare two files with the default chunk size.
pub fn compare_content(a: &Path, b: &Path, mode: CompareMode) -> Tristate {
    let fingerprinter = Fingerprinter::default();
    Comparator::new(mode, DEFAULT_CHUNK_SIZE, &fingerprinter).compare(a, b)
}

fn compare_files(a: &Path, b: &Path, chunk_size: usize) -> Tristate {
    let result = File::open(a)
        .and_then(|file_a| File::open(b).map(|file_b| (file_a, file_b)))
        .and_then(|(file_a, file_b)| compare_streams(file_a, file_b, chunk_size));

    match result {
        Ok(equal) => Tristate::from(equal),
        Err(e) => {
            debug!("Byte comparison of {} and {} failed: {}", a.display(), b.display(), e);
            Tristate::Unknown
        }
    }
}

/// Lockstep chunk comparison of two readers.
///
/// Returns `Ok(false)` as soon as a chunk differs, without consuming the rest
/// of either stream.
pub fn compare_streams<A: Read, B: Read>(
    mut a: A,
    mut b: B,
    chunk_size: usize,
) -> io::Result<bool> {
    let chunk_size = chunk_size.max(1);
    let mut buf_a = vec![0; chunk_size];
    let mut buf_b = vec![0; chunk_size];

    loop {
        let n_a = fill_buffer(&mut a, &mut buf_a)?;
        let n_b = fill_buffer(&mut b, &mut buf_b)?;

        if n_a != n_b || buf_a[..n_a] != buf_b[..n_b] {
            return Ok(false);
        }
        if n_a == 0 {
            return Ok(true);
        }
    }
}

/// Read until `buf` is full or the reader hits EOF.
fn fill_buffer<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
