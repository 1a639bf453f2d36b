//! Ed25519 keypair generation, URL-safe base64 persistence, and signing.
//!
//! Keys are stored as URL-safe base64 text files rather than raw DER/PEM so
//! they round-trip through `.env`-style config unmodified. File permissions
//! are tightened to `0600` on Unix where the signing key is written.

use std::path::Path;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;

use veritas_contracts::error::{VeritasError, VeritasResult};

/// A loaded Ed25519 keypair used to sign Trust Log entries.
pub struct AuditKeypair {
    signing_key: SigningKey,
}

impl AuditKeypair {
    /// Generate a fresh keypair, in memory only.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        AuditKeypair { signing_key }
    }

    /// Persist a freshly generated keypair to `private_key_path` and
    /// `public_key_path` as URL-safe base64 text, then return it.
    pub fn generate_and_store(
        private_key_path: &Path,
        public_key_path: &Path,
    ) -> VeritasResult<Self> {
        let keypair = Self::generate();
        keypair.store(private_key_path, public_key_path)?;
        Ok(keypair)
    }

    fn store(&self, private_key_path: &Path, public_key_path: &Path) -> VeritasResult<()> {
        if let Some(parent) = private_key_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| VeritasError::SigningFailed {
                reason: format!("failed to create key directory: {e}"),
            })?;
        }
        let private_b64 = URL_SAFE_NO_PAD.encode(self.signing_key.to_bytes());
        let public_b64 = URL_SAFE_NO_PAD.encode(self.signing_key.verifying_key().to_bytes());

        std::fs::write(private_key_path, &private_b64).map_err(|e| VeritasError::SigningFailed {
            reason: format!("failed to write private key: {e}"),
        })?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(private_key_path, permissions).map_err(|e| {
                VeritasError::SigningFailed {
                    reason: format!("failed to set private key permissions: {e}"),
                }
            })?;
        }
        std::fs::write(public_key_path, &public_b64).map_err(|e| VeritasError::SigningFailed {
            reason: format!("failed to write public key: {e}"),
        })?;
        Ok(())
    }

    /// Load a keypair from a previously stored private key file.
    pub fn load(private_key_path: &Path) -> VeritasResult<Self> {
        let encoded = std::fs::read_to_string(private_key_path).map_err(|e| {
            VeritasError::SigningFailed {
                reason: format!("failed to read private key: {e}"),
            }
        })?;
        let raw = URL_SAFE_NO_PAD
            .decode(encoded.trim())
            .map_err(|e| VeritasError::SigningFailed {
                reason: format!("malformed private key encoding: {e}"),
            })?;
        let bytes: [u8; 32] = raw.try_into().map_err(|_| VeritasError::SigningFailed {
            reason: "private key must be exactly 32 bytes".to_string(),
        })?;
        Ok(AuditKeypair {
            signing_key: SigningKey::from_bytes(&bytes),
        })
    }

    /// Load a keypair if `private_key_path` exists, otherwise generate and
    /// persist a new one. The usual startup path for the gateway.
    pub fn load_or_generate(private_key_path: &Path, public_key_path: &Path) -> VeritasResult<Self> {
        if private_key_path.exists() {
            Self::load(private_key_path)
        } else {
            Self::generate_and_store(private_key_path, public_key_path)
        }
    }

    /// Sign a SHA-256 hex digest string, returning a URL-safe base64
    /// signature. Signs the hex string itself, not the raw hash bytes.
    pub fn sign_hash(&self, hash_hex: &str) -> String {
        let signature: Signature = self.signing_key.sign(hash_hex.as_bytes());
        URL_SAFE_NO_PAD.encode(signature.to_bytes())
    }

    pub fn public_key_b64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.signing_key.verifying_key().to_bytes())
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

/// Verify a signature produced by [`AuditKeypair::sign_hash`] against a
/// standalone public key, without needing the private key loaded.
pub fn verify_hash_signature(hash_hex: &str, signature_b64: &str, public_key_b64: &str) -> bool {
    let Ok(public_raw) = URL_SAFE_NO_PAD.decode(public_key_b64.trim()) else {
        return false;
    };
    let Ok(public_bytes): Result<[u8; 32], _> = public_raw.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_bytes) else {
        return false;
    };
    let Ok(signature_raw) = URL_SAFE_NO_PAD.decode(signature_b64.trim()) else {
        return false;
    };
    let Ok(signature_bytes): Result<[u8; 64], _> = signature_raw.try_into() else {
        return false;
    };
    let signature = Signature::from_bytes(&signature_bytes);
    verifying_key.verify(hash_hex.as_bytes(), &signature).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn generated_keypair_signs_and_verifies() {
        let keypair = AuditKeypair::generate();
        let signature = keypair.sign_hash("deadbeef");
        assert!(verify_hash_signature("deadbeef", &signature, &keypair.public_key_b64()));
    }

    #[test]
    fn tampered_hash_fails_verification() {
        let keypair = AuditKeypair::generate();
        let signature = keypair.sign_hash("deadbeef");
        assert!(!verify_hash_signature("tampered", &signature, &keypair.public_key_b64()));
    }

    #[test]
    fn load_or_generate_round_trips_through_disk() {
        let dir = tempdir().unwrap();
        let private_path = dir.path().join("audit.key");
        let public_path = dir.path().join("audit.pub");

        let first = AuditKeypair::load_or_generate(&private_path, &public_path).unwrap();
        let second = AuditKeypair::load_or_generate(&private_path, &public_path).unwrap();

        assert_eq!(first.public_key_b64(), second.public_key_b64());
    }
}
