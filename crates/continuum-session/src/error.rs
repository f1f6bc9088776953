//! Error types for the session layer.

use continuum_codec::CodecError;

/// Errors that can occur during session management.
///
/// Anything that goes wrong while *reading* a session (bad signature,
/// expiry, unknown selector, replay, an unreachable store) comes out as
/// [`SessionError::NoSession`]. Callers never learn why a session was
/// refused; the reason is only visible in logs.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// There is no usable session for this request.
    #[error("no valid session")]
    NoSession,

    /// Issuing a token failed because the payload could not be encoded.
    #[error("failed to encode session: {0}")]
    Codec(#[from] CodecError),

    /// Issuing a refresh token failed because the store rejected the
    /// write (after retries, for transient failures).
    #[error("refresh token store failed: {0}")]
    Store(#[from] StoreError),
}

/// Errors reported by a [`RefreshTokenStore`](crate::RefreshTokenStore).
///
/// The split lets the refresh manager retry what might succeed on a
/// second attempt and give up immediately on what won't.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// A temporary failure (timeout, dropped connection). Worth retrying.
    #[error("transient store failure: {0}")]
    Transient(String),

    /// A failure that will not go away by retrying.
    #[error("permanent store failure: {0}")]
    Permanent(String),
}

impl StoreError {
    /// Returns `true` for [`StoreError::Transient`].
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
