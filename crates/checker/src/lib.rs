#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! File-trust verification for downloaded package artifacts
//!
//! Before a downloaded file (repository index, package archive) is trusted
//! and used, it must pass a chain of integrity and authenticity checks.
//! This crate provides the [`FileChecker`] capability and its variants:
//!
//! - [`NullChecker`] — explicit "no verification" placeholder
//! - [`ChecksumChecker`] — digest comparison against trusted metadata, with
//!   out-of-band escalation through a [`TrustDecisionAuthority`]
//! - [`SignatureChecker`] — digital-signature verification through a
//!   key-trust store
//! - [`CompositeChecker`] — an ordered chain of checkers over one file
//!
//! Which checkers apply to which files is the caller's policy; this crate
//! only defines how a configured chain behaves. On failure the caller must
//! not use the file.
//!
//! ```no_run
//! use pkgtrust_checker::{ChecksumChecker, CompositeChecker, FileChecker, StrictAuthority};
//! use pkgtrust_digest::{Checksum, ChecksumAlgorithm};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), pkgtrust_errors::Error> {
//! let expected = Checksum::parse(
//!     "sha256:b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9",
//! )?;
//! let mut chain = CompositeChecker::new();
//! chain.add(ChecksumChecker::new(expected, Arc::new(StrictAuthority)));
//! chain.verify(Path::new("/var/cache/pkg/Packages.gz"))?;
//! # Ok(())
//! # }
//! ```

mod checksum;
mod composite;
mod signature;
mod trust;

pub use checksum::ChecksumChecker;
pub use composite::CompositeChecker;
pub use signature::SignatureChecker;
pub use trust::{StrictAuthority, TrustDecisionAuthority};

use pkgtrust_errors::{Error, VerifyError};
use std::path::Path;
use tracing::debug;

/// A predicate over a downloaded file: it either succeeds silently or fails
/// with a classified [`VerifyError`].
///
/// Checkers never mutate the target file; side effects are limited to
/// logging and delegated trust-decision queries. Repeated `verify` calls
/// against an unchanged file and unchanged collaborators produce identical
/// outcomes.
pub trait FileChecker {
    /// Verify the file at `path`.
    ///
    /// # Errors
    /// Returns a classified error naming the file by base name; see
    /// [`VerifyError`] for the kinds. Digest I/O failures propagate as-is.
    fn verify(&self, path: &Path) -> Result<(), Error>;
}

/// Explicit "no verification" placeholder, so call sites never need an
/// optional checker reference.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullChecker;

impl FileChecker for NullChecker {
    fn verify(&self, path: &Path) -> Result<(), Error> {
        debug!("null check on {}", path.display());
        Ok(())
    }
}

/// Value-semantic checker handle: the closed set of checker variants.
///
/// The default is [`Checker::Unset`], a handle with nothing behind it.
/// Verifying an unset handle directly fails with
/// [`VerifyError::InvalidChecker`]; inside a [`CompositeChecker`] it is
/// logged and skipped instead, so a stray entry cannot block an
/// otherwise-valid chain.
#[derive(Default)]
pub enum Checker {
    #[default]
    Unset,
    Null(NullChecker),
    Checksum(ChecksumChecker),
    Signature(SignatureChecker),
    Composite(CompositeChecker),
}

impl FileChecker for Checker {
    fn verify(&self, path: &Path) -> Result<(), Error> {
        match self {
            Self::Unset => Err(VerifyError::InvalidChecker.into()),
            Self::Null(checker) => checker.verify(path),
            Self::Checksum(checker) => checker.verify(path),
            Self::Signature(checker) => checker.verify(path),
            Self::Composite(checker) => checker.verify(path),
        }
    }
}

impl From<NullChecker> for Checker {
    fn from(checker: NullChecker) -> Self {
        Self::Null(checker)
    }
}

impl From<ChecksumChecker> for Checker {
    fn from(checker: ChecksumChecker) -> Self {
        Self::Checksum(checker)
    }
}

impl From<SignatureChecker> for Checker {
    fn from(checker: SignatureChecker) -> Self {
        Self::Signature(checker)
    }
}

impl From<CompositeChecker> for Checker {
    fn from(checker: CompositeChecker) -> Self {
        Self::Composite(checker)
    }
}

/// File name for error messages: base name only, so messages stay stable
/// across relocations.
pub(crate) fn basename(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}
