//! The double-submit check.
//!
//! ```text
//! GET  /form           → Set-Cookie: XSRF-TOKEN=<value>.<mac>
//! POST /form
//!      Cookie: XSRF-TOKEN=<value>.<mac>
//!      X-XSRF-TOKEN: <value>.<mac>      ← only a same-origin script can copy this
//! ```
//!
//! The cookie is signed so a value planted by a sibling subdomain (which
//! can write cookies but doesn't know the server secret) is refused.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use continuum_codec::{ServerSecret, Signer, constant_time_eq, random_bytes};
use continuum_transport::{Carrier, read_cookie};
use http::header::HeaderName;
use http::{HeaderMap, Method};

use crate::{CsrfConfig, CsrfError};

const CSRF_LABEL: &str = "csrf";
const TOKEN_BYTES: usize = 32;

/// Issues and checks CSRF tokens.
pub struct CsrfGuard {
    config: CsrfConfig,
    header: HeaderName,
    signer: Signer,
}

impl CsrfGuard {
    /// Creates a guard signing tokens with a key derived from `secret`.
    ///
    /// # Errors
    /// [`CsrfError::Transport`] if the configured header name is invalid.
    pub fn new(config: CsrfConfig, secret: &ServerSecret) -> Result<Self, CsrfError> {
        let header = HeaderName::try_from(config.header_name.as_str())
            .map_err(continuum_transport::TransportError::from)?;
        Ok(Self {
            config,
            header,
            signer: secret.signer(CSRF_LABEL),
        })
    }

    /// The configuration this guard was built with.
    pub fn config(&self) -> &CsrfConfig {
        &self.config
    }

    /// Mints a fresh `value.signature` token.
    pub fn mint(&self) -> String {
        let value = URL_SAFE_NO_PAD.encode(random_bytes::<TOKEN_BYTES>());
        let signature = URL_SAFE_NO_PAD.encode(self.signer.sign(value.as_bytes()));
        format!("{value}.{signature}")
    }

    /// `true` if `token` was minted by a guard holding the same secret.
    pub fn verify(&self, token: &str) -> bool {
        let Some((value, signature)) = token.split_once('.') else {
            return false;
        };
        match URL_SAFE_NO_PAD.decode(signature) {
            Ok(signature) => self.signer.verify(value.as_bytes(), &signature),
            Err(_) => false,
        }
    }

    /// The request's token cookie, if it carries a valid one.
    pub fn current(&self, request: &HeaderMap) -> Option<String> {
        read_cookie(request, &self.config.cookie.name).filter(|token| self.verify(token))
    }

    /// Forces a new token onto the response and returns it.
    ///
    /// Call on login, so a token planted before authentication can't be
    /// carried into the session.
    ///
    /// # Errors
    /// [`CsrfError::Transport`] if the cookie can't be written.
    pub fn reissue(&self, response: &mut HeaderMap) -> Result<String, CsrfError> {
        let token = self.mint();
        Carrier::Cookie(self.config.cookie.set_cookie(&token)).apply(response)?;
        tracing::debug!(cookie = %self.config.cookie.name, "issued CSRF token");
        Ok(token)
    }

    /// Checks one request.
    ///
    /// - Safe methods always pass; a token is minted onto `response` if
    ///   the request doesn't already hold a valid one.
    /// - Unsafe methods pass only if the header token equals a valid
    ///   cookie token.
    ///
    /// # Errors
    /// [`CsrfError::TokenMismatch`] for an unsafe request without a
    /// matching token.
    pub fn check(
        &self,
        method: &Method,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<(), CsrfError> {
        if method.is_safe() {
            if self.current(request).is_none() {
                self.reissue(response)?;
            }
            return Ok(());
        }

        let submitted = request
            .get(&self.header)
            .and_then(|value| value.to_str().ok());
        let (Some(submitted), Some(expected)) = (submitted, self.current(request)) else {
            tracing::debug!(%method, "CSRF token missing");
            return Err(CsrfError::TokenMismatch);
        };

        if !constant_time_eq(submitted.as_bytes(), expected.as_bytes()) {
            tracing::warn!(%method, "CSRF token mismatch");
            return Err(CsrfError::TokenMismatch);
        }
        Ok(())
    }
}

impl std::fmt::Debug for CsrfGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfGuard")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
