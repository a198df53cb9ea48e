use std::fmt;
use std::sync::Arc;

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 tag in bytes.
pub const SIGNATURE_LEN: usize = 32;

/// Minimum secret length accepted by the server configuration.
pub const MIN_SECRET_LEN: usize = 32;

/// Process-wide secret used to sign and verify expiring links.
///
/// Loaded once at startup and shared read-only; cloning is cheap. Every node
/// that verifies links must hold the same secret, and changing it invalidates
/// all outstanding links.
#[derive(Clone)]
pub struct SigningKey {
    secret: Arc<[u8]>,
}

impl SigningKey {
    /// Create a signing key from raw secret bytes.
    ///
    /// # Arguments
    ///
    /// * `secret` - The secret used for HMAC computation. Should be at least
    ///   32 bytes for security.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: Arc::from(secret.as_ref()),
        }
    }

    /// Compute the HMAC-SHA256 tag of a message.
    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LEN] {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(message);

        let mut tag = [0u8; SIGNATURE_LEN];
        tag.copy_from_slice(&mac.finalize().into_bytes());
        tag
    }

    /// Check a tag against a message using constant-time comparison.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let expected = self.sign(message);
        expected[..].ct_eq(signature).into()
    }

    /// Short public identifier of the key (hex of the first 4 bytes of its SHA-256).
    ///
    /// Safe to log; lets operators confirm that all nodes share the same secret.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.secret);
        hex::encode(&digest[..4])
    }

    pub fn len(&self) -> usize {
        self.secret.len()
    }

    pub fn is_empty(&self) -> bool {
        self.secret.is_empty()
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}
