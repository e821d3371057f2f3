//! Gzip copies of production artifacts.
//!
//! Production builds emit a `.gz` sibling next to each written artifact so
//! the HTTP layer can serve pre-compressed responses.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

/// Gzip-encode a byte slice.
pub fn gzip_bytes(bytes: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    encoder.finish()
}

/// Write `<path>.gz` next to an already-written artifact.
///
/// Returns the path of the compressed copy.
pub fn write_gzip_copy(path: &Path, bytes: &[u8]) -> io::Result<PathBuf> {
    let mut gz_path = path.as_os_str().to_owned();
    gz_path.push(".gz");
    let gz_path = PathBuf::from(gz_path);

    fs::write(&gz_path, gzip_bytes(bytes)?)?;
    Ok(gz_path)
}
