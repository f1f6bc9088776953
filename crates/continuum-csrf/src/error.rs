use continuum_transport::TransportError;

/// Errors that can occur while checking or issuing CSRF tokens.
#[derive(Debug, thiserror::Error)]
pub enum CsrfError {
    /// An unsafe request didn't echo the token it was issued, or the
    /// cookie it echoed wasn't one this server signed.
    #[error("CSRF token missing or mismatched")]
    TokenMismatch,

    /// The token cookie couldn't be written to the response.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
