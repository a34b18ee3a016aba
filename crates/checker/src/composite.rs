//! Ordered aggregation of checkers over one file

use crate::{Checker, FileChecker};
use pkgtrust_errors::Error;
use std::path::Path;
use tracing::error;

/// An ordered sequence of checkers run against the same file.
///
/// Insertion order is preserved and duplicates are allowed. An empty
/// composite succeeds: "no checks configured" is not itself a failure.
/// The first checker failure propagates to the caller and checkers after
/// it do not run; success requires every configured checker to pass.
///
/// Unset entries are logged and skipped, never raised, so a stray handle
/// cannot block an otherwise-valid chain. Chains may be assembled from
/// data fed by multiple call sites, so this is surfaced via logs rather
/// than enforced at `add` time.
///
/// Build the chain before first use; a composite must not be extended
/// concurrently with an in-flight `verify` on the same instance.
#[derive(Default)]
pub struct CompositeChecker {
    checkers: Vec<Checker>,
}

impl CompositeChecker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a checker to the sequence. Always succeeds.
    pub fn add(&mut self, checker: impl Into<Checker>) -> &mut Self {
        self.checkers.push(checker.into());
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.checkers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.checkers.is_empty()
    }
}

impl FileChecker for CompositeChecker {
    fn verify(&self, path: &Path) -> Result<(), Error> {
        for checker in &self.checkers {
            if matches!(checker, Checker::Unset) {
                error!("invalid checker in chain for {}, skipping", path.display());
                continue;
            }
            checker.verify(path)?;
        }
        Ok(())
    }
}
