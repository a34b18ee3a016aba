//! Out-of-band trust decisions for verification anomalies
//!
//! "Is this content trustworthy despite an anomaly" is a human call, not a
//! checker configuration issue. Checkers that detect a recoverable anomaly
//! (missing or mismatched checksum) ask the authority before failing; an
//! accepted override is logged at warning level since it is a conscious
//! risk acceptance.

use pkgtrust_digest::Checksum;
use std::path::Path;

/// The decision point that can override an automatic verification failure.
///
/// Both queries may block awaiting a human response; both must be
/// idempotent and must not mutate file state.
pub trait TrustDecisionAuthority: Send + Sync {
    /// No checksum was supplied by the source for `file`. Accept anyway?
    fn accept_missing_digest(&self, file: &Path) -> bool;

    /// The computed digest of `file` differs from the expected one.
    /// Accept anyway?
    fn accept_wrong_digest(&self, file: &Path, expected: &Checksum, actual: &Checksum) -> bool;
}

/// Rejects every override request.
///
/// The right authority for unattended runs, where a verification anomaly
/// must always fail the download.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictAuthority;

impl TrustDecisionAuthority for StrictAuthority {
    fn accept_missing_digest(&self, _file: &Path) -> bool {
        false
    }

    fn accept_wrong_digest(&self, _file: &Path, _expected: &Checksum, _actual: &Checksum) -> bool {
        false
    }
}
