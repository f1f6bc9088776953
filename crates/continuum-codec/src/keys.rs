//! Server secret and the keys derived from it.
//!
//! One configured secret feeds several independent keys. Each key is
//! `SHA-256(label || secret)` with a distinct label, so a MAC key can never
//! double as an encryption key and the CSRF signer cannot mint session
//! signatures.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::CodecError;

type HmacSha256 = Hmac<Sha256>;

/// Shortest secret accepted by [`ServerSecret::new`].
pub const MIN_SECRET_LEN: usize = 64;

/// The server-side secret every signature is rooted in.
///
/// `Debug` is implemented by hand so the secret never lands in logs.
#[derive(Clone)]
pub struct ServerSecret(Vec<u8>);

impl ServerSecret {
    /// Wraps a secret, rejecting anything shorter than
    /// [`MIN_SECRET_LEN`] bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::WeakSecret`] for short secrets.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, CodecError> {
        let bytes = secret.as_ref();
        if bytes.len() < MIN_SECRET_LEN {
            return Err(CodecError::WeakSecret {
                min: MIN_SECRET_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }

    /// Derives a 32-byte key for one purpose.
    pub fn derive(&self, label: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(b"continuum:");
        hasher.update(label.as_bytes());
        hasher.update(b":");
        hasher.update(&self.0);
        hasher.finalize().into()
    }

    /// Builds a [`Signer`] keyed for `label`.
    pub fn signer(&self, label: &str) -> Signer {
        Signer {
            key: self.derive(label),
        }
    }
}

impl std::fmt::Debug for ServerSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ServerSecret").field(&"<redacted>").finish()
    }
}

/// HMAC-SHA256 signer with constant-time verification.
#[derive(Clone)]
pub struct Signer {
    key: [u8; 32],
}

impl Signer {
    /// Computes the MAC of `data`.
    pub fn sign(&self, data: &[u8]) -> [u8; 32] {
        let mut mac = self.mac();
        mac.update(data);
        mac.finalize().into_bytes().into()
    }

    /// Checks `signature` against the MAC of `data` in constant time.
    ///
    /// A signature of the wrong length is rejected without comparing.
    pub fn verify(&self, data: &[u8], signature: &[u8]) -> bool {
        let expected = self.sign(data);
        constant_time_eq(&expected, signature)
    }

    fn mac(&self) -> HmacSha256 {
        // HMAC accepts keys of any length; `new_from_slice` only returns
        // `Err` for fixed-key MACs.
        <HmacSha256 as Mac>::new_from_slice(&self.key)
            .expect("HMAC accepts keys of any length")
    }
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer").finish_non_exhaustive()
    }
}

/// Constant-time byte comparison.
///
/// The length check is not constant-time, which is fine: lengths of
/// MACs, hashes and tokens are public.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
