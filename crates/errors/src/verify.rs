//! File verification error types
//!
//! One variant per anomaly kind the checker chain can surface. Callers are
//! expected to match on the kind, never on the message text. Messages name
//! files by base name so they stay stable across relocations.

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum VerifyError {
    /// The expected checksum was empty and the trust authority declined to
    /// accept the file without one.
    #[error("no checksum available for {file}")]
    NoDigest { file: String },

    /// The computed digest differs from the expected one and the trust
    /// authority declined to accept the file anyway.
    #[error("wrong checksum for {file}: expected {expected}, got {actual}")]
    DigestMismatch {
        file: String,
        expected: String,
        actual: String,
    },

    /// A configured detached-signature file does not exist. This is a
    /// configuration error, not a trust judgment; it is never escalated.
    #[error("signature {signature} not found")]
    SignatureMissing { signature: String },

    /// The signature is malformed, the signing key is untrusted, or the
    /// content was altered.
    #[error("signature verification failed for {file}")]
    SignatureInvalid { file: String },

    /// A structurally empty checker was invoked.
    #[error("invalid checker")]
    InvalidChecker,
}

impl UserFacingError for VerifyError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            VerifyError::NoDigest { .. } => {
                Some("The repository did not publish a checksum for this file.")
            }
            VerifyError::DigestMismatch { .. } => {
                Some("The file may be corrupted or tampered with. Re-download it from a trusted mirror.")
            }
            VerifyError::SignatureMissing { .. } => {
                Some("Check the configured detached-signature path.")
            }
            VerifyError::SignatureInvalid { .. } => {
                Some("Import and trust the signing key, or reject the file.")
            }
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            VerifyError::NoDigest { .. } => Some("verify.no_digest"),
            VerifyError::DigestMismatch { .. } => Some("verify.digest_mismatch"),
            VerifyError::SignatureMissing { .. } => Some("verify.signature_missing"),
            VerifyError::SignatureInvalid { .. } => Some("verify.signature_invalid"),
            VerifyError::InvalidChecker => Some("verify.invalid_checker"),
        }
    }
}
