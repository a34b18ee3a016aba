//! The checksum value type published by repository metadata

use crate::{digest_file, ChecksumAlgorithm};
use pkgtrust_errors::{Error, StorageError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// An algorithm identifier plus a digest value.
///
/// A checksum may be empty, meaning the source supplied none. That is a
/// legal state, not an error; whether an unverifiable file is acceptable is
/// a trust decision made elsewhere. Two checksums are equal iff both the
/// algorithm and the value match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Checksum {
    algorithm: Option<ChecksumAlgorithm>,
    value: Vec<u8>,
}

impl Checksum {
    /// Create a checksum from an algorithm and raw digest bytes
    #[must_use]
    pub fn new(algorithm: ChecksumAlgorithm, value: Vec<u8>) -> Self {
        Self {
            algorithm: Some(algorithm),
            value,
        }
    }

    /// The empty checksum: no algorithm, no digest
    #[must_use]
    pub fn empty() -> Self {
        Self {
            algorithm: None,
            value: Vec::new(),
        }
    }

    /// A checksum is empty iff its digest value is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// The algorithm, if one was specified
    #[must_use]
    pub fn algorithm(&self) -> Option<ChecksumAlgorithm> {
        self.algorithm
    }

    /// Raw digest bytes
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// Digest value as lowercase hex
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.value)
    }

    /// Parse a digest from hex for a known algorithm
    ///
    /// # Errors
    /// Returns an error if the input is not valid hexadecimal or its length
    /// does not match the algorithm's digest length.
    pub fn from_hex(algorithm: ChecksumAlgorithm, s: &str) -> Result<Self, Error> {
        let bytes = hex::decode(s).map_err(|e| StorageError::CorruptedData {
            message: format!("invalid hex: {e}"),
        })?;

        if bytes.len() != algorithm.digest_len() {
            return Err(StorageError::CorruptedData {
                message: format!(
                    "{algorithm} digest must be {} bytes, got {}",
                    algorithm.digest_len(),
                    bytes.len()
                ),
            }
            .into());
        }

        Ok(Self::new(algorithm, bytes))
    }

    /// Parse the `algo:hex` string form; `none` parses to the empty checksum
    ///
    /// # Errors
    /// Returns an error on an unknown algorithm or a malformed digest.
    pub fn parse(s: &str) -> Result<Self, Error> {
        if s == "none" {
            return Ok(Self::empty());
        }

        let (algo, hex) = s.split_once(':').ok_or_else(|| StorageError::CorruptedData {
            message: format!("checksum must be `algorithm:hex`, got: {s}"),
        })?;
        Self::from_hex(algo.parse()?, hex)
    }

    /// Compute the checksum of the file at `path` with the given algorithm
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened or read.
    pub fn compute_file(path: &Path, algorithm: ChecksumAlgorithm) -> Result<Self, Error> {
        Ok(Self::new(algorithm, digest_file(path, algorithm)?))
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.algorithm {
            Some(algorithm) if !self.is_empty() => {
                write!(f, "{algorithm}:{}", self.to_hex())
            }
            _ => f.write_str("none"),
        }
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
