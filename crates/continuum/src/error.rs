//! Unified error type for Continuum.

use continuum_codec::CodecError;
use continuum_csrf::CsrfError;
use continuum_session::SessionError;
use continuum_transport::TransportError;
use http::StatusCode;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `continuum` meta-crate, you deal with this single
/// error type instead of importing errors from each sub-crate.
/// The `#[from]` attribute on each variant auto-generates `From` impls,
/// so the `?` operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum ContinuumError {
    /// A codec-level error outside of reading a session (e.g. a weak
    /// secret at startup).
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A session-level error (no session, store failure on issue).
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A CSRF check failed.
    #[error(transparent)]
    Csrf(#[from] CsrfError),

    /// A token couldn't be written to the response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl ContinuumError {
    /// The HTTP status a router should answer with.
    ///
    /// | Error | Status |
    /// |---|---|
    /// | no session | 401 |
    /// | CSRF token mismatch | 403 |
    /// | anything else | 500 |
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Session(SessionError::NoSession) => StatusCode::UNAUTHORIZED,
            Self::Csrf(CsrfError::TokenMismatch) => StatusCode::FORBIDDEN,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
