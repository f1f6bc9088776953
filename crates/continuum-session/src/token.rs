//! Refresh token wire form: `selector:secret`.
//!
//! - The **selector** is a lookup key. It is stored in plain text and may
//!   show up in logs.
//! - The **secret** is only ever stored as a SHA-256 hash. A leaked store
//!   therefore can't be replayed against the server.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use continuum_codec::{constant_time_eq, random_token};
use sha2::{Digest, Sha256};

/// Bytes of entropy in a selector.
const SELECTOR_BYTES: usize = 16;
/// Bytes of entropy in a secret.
const SECRET_BYTES: usize = 32;

/// A parsed (or freshly generated) refresh token.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshToken {
    selector: String,
    secret: String,
}

impl RefreshToken {
    /// Mints a new token with a random selector and secret.
    pub fn generate() -> Self {
        Self {
            selector: random_token::<SELECTOR_BYTES>(),
            secret: random_token::<SECRET_BYTES>(),
        }
    }

    /// Parses a `selector:secret` string.
    ///
    /// Returns `None` when the separator is missing or either half is
    /// empty. Nothing else is checked here; an unknown selector or a wrong
    /// secret is only discovered against the store.
    pub fn parse(raw: &str) -> Option<Self> {
        let (selector, secret) = raw.split_once(':')?;
        if selector.is_empty() || secret.is_empty() {
            return None;
        }
        Some(Self {
            selector: selector.to_owned(),
            secret: secret.to_owned(),
        })
    }

    /// The store lookup key.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    /// The hash to persist for this token's secret.
    pub fn secret_hash(&self) -> String {
        hash_secret(&self.secret)
    }

    /// Checks the secret against a stored hash in constant time.
    pub fn matches(&self, stored_hash: &str) -> bool {
        constant_time_eq(self.secret_hash().as_bytes(), stored_hash.as_bytes())
    }
}

impl fmt::Display for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.selector, self.secret)
    }
}

// The secret must stay out of logs.
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshToken")
            .field("selector", &self.selector)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// SHA-256 of `secret`, base64url without padding.
pub fn hash_secret(secret: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(secret.as_bytes()))
}
