use std::io::Read;
use std::path::Path;

use log::debug;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Hex-encoded SHA-256 of a file, computed without loading it into memory.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn sha256_file(path: &Path) -> Result<String, CoreError> {
    let mut file = std::fs::File::open(path)
        .map_err(|error| CoreError::io_with_path("failed to open file for checksum", path, error))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 32 * 1024];

    loop {
        let read = file.read(&mut buffer).map_err(|error| {
            CoreError::io_with_path("failed to read file for checksum", path, error)
        })?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Check that `path` hashes to `expected`, ignoring case and surrounding
/// whitespace in the expected digest.
///
/// # Errors
/// Returns [`CoreError::DigestMismatch`] when the digests differ, or an I/O
/// error when the file cannot be read.
pub fn verify_sha256(path: &Path, expected: &str) -> Result<(), CoreError> {
    let expected = expected.trim().to_ascii_lowercase();
    let actual = sha256_file(path)?;

    if actual == expected {
        debug!("SHA-256 verified for {}", path.display());
        Ok(())
    } else {
        Err(CoreError::DigestMismatch {
            path: path.to_path_buf(),
            expected,
            actual,
        })
    }
}
