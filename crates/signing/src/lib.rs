#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Key-trust store and signature verification for pkgtrust
//!
//! Downloaded repository metadata is authenticated against detached
//! minisign signatures. The [`KeyStore`] trait is the narrow contract the
//! verification core consumes: key import with an explicit trust flag, and
//! a verdict on a file's signature under a caller-supplied context.
//!
//! [`MinisignKeyStore`] is the in-process implementation. Keys imported as
//! untrusted stay "known but not yet trusted"; if such a key validates a
//! signature, the store consults its [`KeyTrustDecider`] policy hook (if
//! any) before accepting, keeping all key-trust decisions in one place.

use minisign_verify::{PublicKey, Signature};
use pkgtrust_errors::{Error, SigningError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Signature algorithm of a registered key
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyAlgorithm {
    Minisign,
    // OpenPgp (future)
}

/// A public key registered with a key store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicKeyRef {
    pub id: String,
    pub algo: KeyAlgorithm,
    /// Base64 key data in minisign's own encoding
    pub data: String,
}

/// Caller-supplied verification context.
///
/// Opaque to the verification core; the key store may use it to apply
/// context-specific trust policy (e.g. "this key is only expected to sign
/// content from this repository").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyContext {
    pub repository: Option<String>,
    pub vendor: Option<String>,
}

impl VerifyContext {
    /// Context naming the repository the signed content came from
    #[must_use]
    pub fn for_repository(name: impl Into<String>) -> Self {
        Self {
            repository: Some(name.into()),
            vendor: None,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.repository.is_none() && self.vendor.is_none()
    }
}

/// Policy hook deciding whether a key that validated a signature but is not
/// yet trusted may be trusted under the given context.
///
/// May block on human input.
pub trait KeyTrustDecider: Send + Sync {
    fn trust_key(&self, key: &PublicKeyRef, context: &VerifyContext) -> bool;
}

/// The key-trust store contract consumed by the verification core.
pub trait KeyStore: Send + Sync {
    /// Register a public key from a key file on disk.
    ///
    /// `trusted = false` means "known but not yet trusted", deferring the
    /// trust decision to the store's internal policy. Returns the key id.
    ///
    /// # Errors
    /// Returns an error if the key file cannot be read or is not a valid
    /// public key.
    fn import_key(&self, path: &Path, trusted: bool) -> Result<String, Error>;

    /// Whether the signature over `path` is valid *and* the signing key is
    /// trusted under `context`.
    ///
    /// `signature` is the detached-signature path, if the caller configured
    /// one; `display_name` is how the file should be named in logs and
    /// prompts. Internal trust escalation, if any, is this store's
    /// responsibility.
    ///
    /// # Errors
    /// Returns an error if the content file cannot be read. A malformed or
    /// non-validating signature is a verdict (`Ok(false)`), not an error.
    fn verify_signature(
        &self,
        path: &Path,
        display_name: &str,
        signature: Option<&Path>,
        context: &VerifyContext,
    ) -> Result<bool, Error>;
}

struct KeyEntry {
    key: PublicKeyRef,
    trusted: bool,
}

/// In-process key store backed by minisign keys.
#[derive(Default)]
pub struct MinisignKeyStore {
    keys: RwLock<Vec<KeyEntry>>,
    decider: Option<Box<dyn KeyTrustDecider>>,
}

impl MinisignKeyStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that escalates untrusted-key decisions to `decider`
    #[must_use]
    pub fn with_decider(decider: Box<dyn KeyTrustDecider>) -> Self {
        Self {
            keys: RwLock::new(Vec::new()),
            decider: Some(decider),
        }
    }

    /// Register an already-parsed key
    ///
    /// # Errors
    /// Returns an error if the key data is not a valid minisign public key.
    pub fn add_key(&self, key: PublicKeyRef, trusted: bool) -> Result<(), Error> {
        PublicKey::from_base64(&key.data)
            .map_err(|e| SigningError::InvalidPublicKey(format!("{}: {e}", key.id)))?;
        self.lock_write()?.push(KeyEntry { key, trusted });
        Ok(())
    }

    fn lock_read(&self) -> Result<std::sync::RwLockReadGuard<'_, Vec<KeyEntry>>, Error> {
        self.keys
            .read()
            .map_err(|_| Error::internal("key store lock poisoned"))
    }

    fn lock_write(&self) -> Result<std::sync::RwLockWriteGuard<'_, Vec<KeyEntry>>, Error> {
        self.keys
            .write()
            .map_err(|_| Error::internal("key store lock poisoned"))
    }

    fn key_verifies(key: &PublicKeyRef, content: &[u8], signature: &Signature) -> bool {
        match PublicKey::from_base64(&key.data) {
            Ok(pk) => pk.verify(content, signature, false).is_ok(),
            Err(e) => {
                warn!("invalid key data for {}: {e}", key.id);
                false
            }
        }
    }
}

/// Extract the base64 key line from a minisign public key file
/// (an `untrusted comment:` line followed by the key data).
fn parse_key_file(contents: &str, path: &Path) -> Result<String, Error> {
    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty() && !line.starts_with("untrusted comment:"))
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            SigningError::InvalidPublicKey(format!("no key data in {}", path.display())).into()
        })
}

impl KeyStore for MinisignKeyStore {
    fn import_key(&self, path: &Path, trusted: bool) -> Result<String, Error> {
        let contents = fs::read_to_string(path).map_err(|_| SigningError::KeyFileNotFound {
            path: path.display().to_string(),
        })?;
        let data = parse_key_file(&contents, path)?;

        PublicKey::from_base64(&data)
            .map_err(|e| SigningError::InvalidPublicKey(format!("{}: {e}", path.display())))?;

        let id = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());

        debug!("imported key {id} (trusted: {trusted})");
        self.lock_write()?.push(KeyEntry {
            key: PublicKeyRef {
                id: id.clone(),
                algo: KeyAlgorithm::Minisign,
                data,
            },
            trusted,
        });
        Ok(id)
    }

    fn verify_signature(
        &self,
        path: &Path,
        display_name: &str,
        signature: Option<&Path>,
        context: &VerifyContext,
    ) -> Result<bool, Error> {
        let sig_path = signature.map_or_else(
            || PathBuf::from(format!("{}.minisig", path.display())),
            Path::to_path_buf,
        );

        if !sig_path.exists() {
            debug!("no signature at {} for {display_name}", sig_path.display());
            return Ok(false);
        }

        let sig_text =
            fs::read_to_string(&sig_path).map_err(|e| Error::io_with_path(&e, &sig_path))?;
        let sig = match Signature::decode(&sig_text) {
            Ok(sig) => sig,
            Err(e) => {
                warn!("malformed signature {}: {e}", sig_path.display());
                return Ok(false);
            }
        };

        let content = fs::read(path).map_err(|e| Error::io_with_path(&e, path))?;

        let mut promote = None;
        {
            let keys = self.lock_read()?;
            if keys.is_empty() {
                debug!("no keys registered to verify {display_name}");
                return Ok(false);
            }

            for entry in keys.iter().filter(|e| e.trusted) {
                if Self::key_verifies(&entry.key, &content, &sig) {
                    debug!(
                        "signature on {display_name} verified by trusted key {}",
                        entry.key.id
                    );
                    return Ok(true);
                }
            }

            // The signature is valid under a known-but-untrusted key: the
            // trust decision belongs to the store's policy hook.
            for entry in keys.iter().filter(|e| !e.trusted) {
                if Self::key_verifies(&entry.key, &content, &sig) {
                    if let Some(decider) = &self.decider {
                        if decider.trust_key(&entry.key, context) {
                            warn!(
                                "key {} accepted for {display_name} by trust policy",
                                entry.key.id
                            );
                            promote = Some(entry.key.id.clone());
                            break;
                        }
                    }
                    debug!(
                        "key {} validates {display_name} but is not trusted",
                        entry.key.id
                    );
                }
            }
        }

        if let Some(id) = promote {
            // Promotion lasts for the store's lifetime
            for entry in self.lock_write()?.iter_mut() {
                if entry.key.id == id {
                    entry.trusted = true;
                }
            }
            return Ok(true);
        }

        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn keypair() -> (String, minisign::SecretKey) {
        let minisign::KeyPair { pk, sk } =
            minisign::KeyPair::generate_unencrypted_keypair().unwrap();
        (pk.to_box().unwrap().into_string(), sk)
    }

    fn sign(sk: &minisign::SecretKey, data: &[u8]) -> String {
        minisign::sign(None, sk, Cursor::new(data), None, None)
            .unwrap()
            .into_string()
    }

    struct Fixture {
        dir: TempDir,
        store: MinisignKeyStore,
        key_path: std::path::PathBuf,
        content: std::path::PathBuf,
    }

    fn fixture(store: MinisignKeyStore, data: &[u8]) -> (Fixture, minisign::SecretKey) {
        let (key_box, sk) = keypair();
        let dir = TempDir::new().unwrap();

        let key_path = dir.path().join("repo.pub");
        fs::write(&key_path, key_box).unwrap();

        let content = dir.path().join("Packages.gz");
        fs::write(&content, data).unwrap();
        let sig = sign(&sk, data);
        fs::write(dir.path().join("Packages.gz.minisig"), sig).unwrap();

        (
            Fixture {
                dir,
                store,
                key_path,
                content,
            },
            sk,
        )
    }

    #[test]
    fn test_trusted_key_verifies() {
        let (fx, _) = fixture(MinisignKeyStore::new(), b"index data");
        fx.store.import_key(&fx.key_path, true).unwrap();

        let ok = fx
            .store
            .verify_signature(&fx.content, "Packages.gz", None, &VerifyContext::default())
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_untrusted_key_rejected_without_decider() {
        let (fx, _) = fixture(MinisignKeyStore::new(), b"index data");
        fx.store.import_key(&fx.key_path, false).unwrap();

        let ok = fx
            .store
            .verify_signature(&fx.content, "Packages.gz", None, &VerifyContext::default())
            .unwrap();
        assert!(!ok);
    }

    struct AcceptAll;
    impl KeyTrustDecider for AcceptAll {
        fn trust_key(&self, _key: &PublicKeyRef, _context: &VerifyContext) -> bool {
            true
        }
    }

    #[test]
    fn test_untrusted_key_promoted_by_decider() {
        let (fx, _) = fixture(MinisignKeyStore::with_decider(Box::new(AcceptAll)), b"data");
        fx.store.import_key(&fx.key_path, false).unwrap();

        let ctx = VerifyContext::for_repository("main");
        let ok = fx
            .store
            .verify_signature(&fx.content, "Packages.gz", None, &ctx)
            .unwrap();
        assert!(ok);

        // Promoted for the session: verifies again without re-asking
        let again = fx
            .store
            .verify_signature(&fx.content, "Packages.gz", None, &ctx)
            .unwrap();
        assert!(again);
    }

    #[test]
    fn test_tampered_content_fails() {
        let (fx, _) = fixture(MinisignKeyStore::new(), b"original");
        fx.store.import_key(&fx.key_path, true).unwrap();
        fs::write(&fx.content, b"tampered").unwrap();

        let ok = fx
            .store
            .verify_signature(&fx.content, "Packages.gz", None, &VerifyContext::default())
            .unwrap();
        assert!(!ok);
    }

    #[test]
    fn test_missing_and_garbage_signature() {
        let (fx, _) = fixture(MinisignKeyStore::new(), b"data");
        fx.store.import_key(&fx.key_path, true).unwrap();

        let other = fx.dir.path().join("unsigned.deb");
        fs::write(&other, b"payload").unwrap();
        assert!(!fx
            .store
            .verify_signature(&other, "unsigned.deb", None, &VerifyContext::default())
            .unwrap());

        let sig_path = fx.dir.path().join("Packages.gz.minisig");
        fs::write(&sig_path, "not a signature").unwrap();
        assert!(!fx
            .store
            .verify_signature(&fx.content, "Packages.gz", None, &VerifyContext::default())
            .unwrap());
    }

    #[test]
    fn test_explicit_detached_signature_path() {
        let data = b"release file";
        let (fx, sk) = fixture(MinisignKeyStore::new(), data);
        fx.store.import_key(&fx.key_path, true).unwrap();

        let detached = fx.dir.path().join("Release.sig");
        fs::write(&detached, sign(&sk, data)).unwrap();

        let ok = fx
            .store
            .verify_signature(
                &fx.content,
                "Packages.gz",
                Some(&detached),
                &VerifyContext::default(),
            )
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn test_import_key_errors() {
        let store = MinisignKeyStore::new();
        let err = store
            .import_key(Path::new("/nonexistent/repo.pub"), true)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::KeyFileNotFound { .. })
        ));

        let dir = TempDir::new().unwrap();
        let bad = dir.path().join("bad.pub");
        fs::write(&bad, "untrusted comment: x\n!!!not base64!!!\n").unwrap();
        let err = store.import_key(&bad, true).unwrap_err();
        assert!(matches!(
            err,
            Error::Signing(SigningError::InvalidPublicKey(_))
        ));
    }
}
