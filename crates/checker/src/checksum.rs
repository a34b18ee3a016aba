//! Checksum verification with out-of-band escalation

use crate::{basename, FileChecker, TrustDecisionAuthority};
use pkgtrust_digest::{Checksum, ChecksumAlgorithm};
use pkgtrust_errors::{Error, VerifyError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Verifies a file against the expected checksum from trusted metadata.
///
/// An empty expected checksum is legal ("the source supplied none") and is
/// escalated to the trust authority rather than failing outright; so is a
/// mismatch. The two are distinct failure kinds because their risk profiles
/// differ: unpublished metadata vs. tampering or corruption.
pub struct ChecksumChecker {
    expected: Checksum,
    authority: Arc<dyn TrustDecisionAuthority>,
}

impl ChecksumChecker {
    #[must_use]
    pub fn new(expected: Checksum, authority: Arc<dyn TrustDecisionAuthority>) -> Self {
        Self {
            expected,
            authority,
        }
    }

    /// The expected checksum this checker was configured with
    #[must_use]
    pub fn expected(&self) -> &Checksum {
        &self.expected
    }
}

impl FileChecker for ChecksumChecker {
    fn verify(&self, path: &Path) -> Result<(), Error> {
        debug!(
            "checking {} against checksum '{}'",
            path.display(),
            self.expected
        );
        let algorithm = self
            .expected
            .algorithm()
            .unwrap_or(ChecksumAlgorithm::DEFAULT);
        let actual = Checksum::compute_file(path, algorithm)?;

        if self.expected.is_empty() {
            debug!("{} has no checksum available", path.display());
            if self.authority.accept_missing_digest(path) {
                warn!("user accepted {} with no checksum", path.display());
                return Ok(());
            }
            return Err(VerifyError::NoDigest {
                file: basename(path),
            }
            .into());
        }

        if actual != self.expected {
            if self.authority.accept_wrong_digest(path, &self.expected, &actual) {
                warn!("user accepted {} with wrong checksum", path.display());
                return Ok(());
            }
            return Err(VerifyError::DigestMismatch {
                file: basename(path),
                expected: self.expected.to_string(),
                actual: actual.to_string(),
            }
            .into());
        }

        Ok(())
    }
}
