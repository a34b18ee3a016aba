#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Digest computation and checksum values for pkgtrust
//!
//! This crate provides the [`Checksum`] value type (an algorithm identifier
//! plus a digest value, as published in repository metadata) and streaming
//! digest computation over downloaded files.

mod checksum;

pub use checksum::Checksum;

use md5::Md5;
use pkgtrust_errors::{Error, StorageError};
use serde::{Deserialize, Serialize};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

/// Size of chunks for streaming digest computation
const CHUNK_SIZE: usize = 64 * 1024; // 64KB

/// Digest algorithms accepted in repository metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
}

impl ChecksumAlgorithm {
    /// Algorithm used when a source did not specify one
    pub const DEFAULT: Self = Self::Sha256;

    /// Digest length in bytes
    #[must_use]
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md5 => 16,
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha512 => 64,
        }
    }

    /// Canonical lowercase name, as written in metadata files
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha1 => "sha1",
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ChecksumAlgorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md5" => Ok(Self::Md5),
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            _ => Err(StorageError::CorruptedData {
                message: format!("unknown checksum algorithm: {s}"),
            }
            .into()),
        }
    }
}

/// Compute the digest of the file at `path` with the given algorithm.
///
/// Reads the file fully, in 64KB chunks.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn digest_file(path: &Path, algorithm: ChecksumAlgorithm) -> Result<Vec<u8>, Error> {
    let file = File::open(path).map_err(|e| StorageError::from_io_with_path(&e, path))?;
    digest_reader(file, algorithm)
}

/// Compute the digest of everything `reader` yields.
///
/// # Errors
/// Returns an error if reading fails.
pub fn digest_reader<R: Read>(reader: R, algorithm: ChecksumAlgorithm) -> Result<Vec<u8>, Error> {
    match algorithm {
        ChecksumAlgorithm::Md5 => hash_reader::<Md5, _>(reader),
        ChecksumAlgorithm::Sha1 => hash_reader::<Sha1, _>(reader),
        ChecksumAlgorithm::Sha256 => hash_reader::<Sha256, _>(reader),
        ChecksumAlgorithm::Sha512 => hash_reader::<Sha512, _>(reader),
    }
}

/// Compute the digest of a byte slice
#[must_use]
pub fn digest_data(data: &[u8], algorithm: ChecksumAlgorithm) -> Vec<u8> {
    match algorithm {
        ChecksumAlgorithm::Md5 => Md5::digest(data).to_vec(),
        ChecksumAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
        ChecksumAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
        ChecksumAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
    }
}

fn hash_reader<D: Digest, R: Read>(mut reader: R) -> Result<Vec<u8>, Error> {
    let mut hasher = D::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let n = reader.read(&mut buffer)?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hasher.finalize().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_known_digests() {
        let data = b"hello world";
        assert_eq!(
            hex::encode(digest_data(data, ChecksumAlgorithm::Md5)),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
        assert_eq!(
            hex::encode(digest_data(data, ChecksumAlgorithm::Sha1)),
            "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed"
        );
        assert_eq!(
            hex::encode(digest_data(data, ChecksumAlgorithm::Sha256)),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_digest_file_matches_digest_data() {
        let mut temp = NamedTempFile::new().unwrap();
        let data = b"repository index content";
        temp.write_all(data).unwrap();

        let from_file = digest_file(temp.path(), ChecksumAlgorithm::Sha256).unwrap();
        assert_eq!(from_file, digest_data(data, ChecksumAlgorithm::Sha256));
    }

    #[test]
    fn test_digest_file_missing() {
        let err = digest_file(
            Path::new("/nonexistent/Packages.gz"),
            ChecksumAlgorithm::Sha256,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            Error::Storage(StorageError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_algorithm_parse() {
        assert_eq!(
            "sha256".parse::<ChecksumAlgorithm>().unwrap(),
            ChecksumAlgorithm::Sha256
        );
        assert!("sha3-256".parse::<ChecksumAlgorithm>().is_err());
    }

    #[test]
    fn test_digest_lengths() {
        for algo in [
            ChecksumAlgorithm::Md5,
            ChecksumAlgorithm::Sha1,
            ChecksumAlgorithm::Sha256,
            ChecksumAlgorithm::Sha512,
        ] {
            assert_eq!(digest_data(b"x", algo).len(), algo.digest_len());
        }
    }
}
