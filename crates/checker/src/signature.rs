//! Digital-signature verification against the key-trust store

use crate::{basename, FileChecker};
use pkgtrust_errors::{Error, VerifyError};
use pkgtrust_signing::{KeyStore, VerifyContext};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Verifies a file's digital signature through a [`KeyStore`].
///
/// With a detached-signature path configured, that file must exist before
/// anything else is attempted: a configured-but-absent signature is a
/// configuration error, never eligible for interactive override, since
/// there is nothing to evaluate. Without one, the store looks for the
/// signature in its default location. A failed verification is not offered
/// a local override either; the "do you trust this key" decision point
/// lives inside the key store itself.
pub struct SignatureChecker {
    keystore: Arc<dyn KeyStore>,
    signature: Option<PathBuf>,
    context: VerifyContext,
}

impl SignatureChecker {
    /// Checker expecting the signature in the store's default location
    #[must_use]
    pub fn new(keystore: Arc<dyn KeyStore>) -> Self {
        Self {
            keystore,
            signature: None,
            context: VerifyContext::default(),
        }
    }

    /// Use a detached signature at `signature`
    #[must_use]
    pub fn with_detached_signature(mut self, signature: impl Into<PathBuf>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Set the verification context passed through to the key store
    #[must_use]
    pub fn with_context(mut self, context: VerifyContext) -> Self {
        self.context = context;
        self
    }

    /// Import a public key into the key store (known but not yet trusted)
    /// and record the context under which it is expected to sign.
    ///
    /// Preparatory step, not part of `verify`.
    ///
    /// # Errors
    /// Returns an error if the key cannot be imported.
    pub fn add_public_key(&mut self, key: &Path, context: VerifyContext) -> Result<(), Error> {
        self.keystore.import_key(key, false)?;
        self.context = context;
        Ok(())
    }
}

impl FileChecker for SignatureChecker {
    fn verify(&self, path: &Path) -> Result<(), Error> {
        if let Some(signature) = &self.signature {
            if !signature.exists() {
                return Err(VerifyError::SignatureMissing {
                    signature: signature.display().to_string(),
                }
                .into());
            }
        }

        debug!(
            "checking {} validity using digital signature",
            path.display()
        );
        let valid = self.keystore.verify_signature(
            path,
            &basename(path),
            self.signature.as_deref(),
            &self.context,
        )?;

        if valid {
            Ok(())
        } else {
            Err(VerifyError::SignatureInvalid {
                file: basename(path),
            }
            .into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Key store with a canned verdict and call counters
    #[derive(Default)]
    struct FakeKeyStore {
        valid: bool,
        verify_calls: AtomicUsize,
        imports: Mutex<Vec<(PathBuf, bool)>>,
    }

    impl KeyStore for FakeKeyStore {
        fn import_key(&self, path: &Path, trusted: bool) -> Result<String, Error> {
            self.imports.lock().unwrap().push((path.to_path_buf(), trusted));
            Ok("fake-key".into())
        }

        fn verify_signature(
            &self,
            _path: &Path,
            _display_name: &str,
            _signature: Option<&Path>,
            _context: &VerifyContext,
        ) -> Result<bool, Error> {
            self.verify_calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.valid)
        }
    }

    #[test]
    fn test_valid_signature() {
        let store = Arc::new(FakeKeyStore {
            valid: true,
            ..FakeKeyStore::default()
        });
        let checker = SignatureChecker::new(store.clone());

        checker.verify(Path::new("/tmp/Packages.gz")).unwrap();
        assert_eq!(store.verify_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_signature() {
        let store = Arc::new(FakeKeyStore::default());
        let checker = SignatureChecker::new(store.clone());

        let err = checker.verify(Path::new("/tmp/Packages.gz")).unwrap_err();
        assert!(matches!(
            err,
            Error::Verify(VerifyError::SignatureInvalid { .. })
        ));
    }

    #[test]
    fn test_missing_detached_signature_never_reaches_store() {
        let store = Arc::new(FakeKeyStore {
            valid: true,
            ..FakeKeyStore::default()
        });
        let checker = SignatureChecker::new(store.clone())
            .with_detached_signature("/nonexistent/Release.sig");

        let err = checker.verify(Path::new("/tmp/Release")).unwrap_err();
        assert!(matches!(
            err,
            Error::Verify(VerifyError::SignatureMissing { .. })
        ));
        assert_eq!(store.verify_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_existing_detached_signature_is_passed_through() {
        let dir = TempDir::new().unwrap();
        let sig = dir.path().join("Release.sig");
        std::fs::write(&sig, "sig").unwrap();

        let store = Arc::new(FakeKeyStore {
            valid: true,
            ..FakeKeyStore::default()
        });
        let checker = SignatureChecker::new(store.clone()).with_detached_signature(&sig);

        checker.verify(Path::new("/tmp/Release")).unwrap();
        assert_eq!(store.verify_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_add_public_key_imports_untrusted() {
        let store = Arc::new(FakeKeyStore::default());
        let mut checker = SignatureChecker::new(store.clone());

        let context = VerifyContext::for_repository("main");
        checker
            .add_public_key(Path::new("/etc/pkg/keys/repo.pub"), context.clone())
            .unwrap();

        let imports = store.imports.lock().unwrap();
        assert_eq!(imports.len(), 1);
        assert!(!imports[0].1, "key must be imported as not-yet-trusted");
        assert_eq!(checker.context, context);
    }
}
