//! Streaming archive checksums.

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Hex digests of a finished archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checksums {
    /// Lowercase hex SHA-256 (64 characters).
    pub sha256: String,
    /// Lowercase hex MD5 (32 characters).
    pub md5: String,
}

/// Computes SHA-256 and MD5 of a file in one pass.
///
/// Reads `chunk_size` bytes at a time so large archives are never held in
/// memory. A zero chunk size reads one byte at a time.
///
/// # Errors
///
/// Returns the underlying I/O error if the file cannot be read.
pub fn compute_checksums(path: &Path, chunk_size: usize) -> io::Result<Checksums> {
    let mut file = fs::File::open(path)?;
    let mut sha256 = Sha256::new();
    let mut md5 = Md5::new();
    let mut buffer = vec![0u8; chunk_size.max(1)];
    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        let chunk = buffer.get(..bytes_read).unwrap_or_default();
        sha256.update(chunk);
        md5.update(chunk);
    }
    Ok(Checksums {
        sha256: format!("{:x}", sha256.finalize()),
        md5: format!("{:x}", md5.finalize()),
    })
}
