//! Key-store and signature error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
pub enum SigningError {
    #[error("signature verification failed: {reason}")]
    VerificationFailed { reason: String },

    #[error("no trusted key found for signature with key id: {key_id}")]
    NoTrustedKeyFound { key_id: String },

    #[error("invalid signature format: {0}")]
    InvalidSignatureFormat(String),

    #[error("invalid public key format: {0}")]
    InvalidPublicKey(String),

    #[error("public key file not found: {path}")]
    KeyFileNotFound { path: String },
}

impl UserFacingError for SigningError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            SigningError::NoTrustedKeyFound { .. } => {
                Some("Import the repository's public key and mark it trusted.")
            }
            SigningError::KeyFileNotFound { .. } => Some("Check the public key path."),
            _ => None,
        }
    }

    fn user_code(&self) -> Option<&'static str> {
        match self {
            SigningError::VerificationFailed { .. } => Some("signing.verification_failed"),
            SigningError::NoTrustedKeyFound { .. } => Some("signing.no_trusted_key"),
            SigningError::InvalidSignatureFormat(_) => Some("signing.invalid_signature_format"),
            SigningError::InvalidPublicKey(_) => Some("signing.invalid_public_key"),
            SigningError::KeyFileNotFound { .. } => Some("signing.key_file_not_found"),
        }
    }
}
