//! Error types for the codec layer.
//!
//! Each crate in Continuum defines its own error enum. A `CodecError`
//! always means the problem is in turning a payload into a token or a
//! token back into a payload, never in storage or transport.

/// Errors that can occur while encoding or decoding a session token.
///
/// The decode-side variants are deliberately coarse. Managers above this
/// layer collapse all of them into a single "no session" outcome, so the
/// detail here exists for tests and debug logging only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// The token does not have the expected segment structure, or a
    /// segment is not valid base64url / decimal.
    #[error("malformed token")]
    MalformedToken,

    /// The MAC recomputed over the token does not match its signature.
    ///
    /// This check runs before anything else in the token is trusted.
    #[error("invalid token signature")]
    InvalidSignature,

    /// The signature is valid but the embedded expiry has passed.
    #[error("token expired")]
    Expired,

    /// The payload was authentic but could not be turned back into the
    /// session type (for example, a map segment without `=`).
    #[error("payload deserialization failed: {0}")]
    Deserialization(String),

    /// The session value could not be serialized.
    #[error("payload serialization failed: {0}")]
    Serialization(String),

    /// Authenticated encryption of the payload failed, or the ciphertext
    /// did not authenticate on the way back.
    #[error("payload encryption failed")]
    Encryption,

    /// The configured server secret is too short to derive keys from.
    #[error("server secret must be at least {min} bytes, got {actual}")]
    WeakSecret {
        /// Minimum accepted length.
        min: usize,
        /// Length that was supplied.
        actual: usize,
    },
}
