//! Cryptographically secure random values.
//!
//! `rand::rng()` is a thread-local CSPRNG reseeded from the operating
//! system, so it is suitable for secrets. Everything unguessable in
//! Continuum (refresh selectors and secrets, CSRF tokens, nonces, lineage
//! ids) comes from here.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::Rng;

/// Returns `N` random bytes.
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::rng().fill(&mut bytes[..]);
    bytes
}

/// Returns `N` random bytes encoded as unpadded base64url.
///
/// 16 bytes gives a 22-character string, 32 bytes a 43-character one.
pub fn random_token<const N: usize>() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes::<N>())
}
