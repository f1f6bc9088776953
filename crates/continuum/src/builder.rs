//! `ContinuumBuilder`: one secret and a set of configs in, ready-made
//! managers, transports and guards out.

use std::sync::Arc;

use continuum_codec::{Clock, ServerSecret, SessionSerializer, SystemClock};
use continuum_csrf::{CsrfConfig, CsrfGuard};
use continuum_session::{
    OneOffManager, RefreshManager, RefreshTokenStore, SessionConfig, SessionStrategy,
};
use continuum_transport::{
    CookieTransport, CookieTransportConfig, HeaderTransport, HeaderTransportConfig,
    SessionTransport,
};

use crate::{ContinuumError, SessionDirectives};

/// Builder for configuring Continuum.
///
/// Every component it hands out derives its keys from the same secret, so
/// build them all from one builder.
///
/// # Example
///
/// ```rust
/// use std::sync::Arc;
/// use continuum::prelude::*;
///
/// let builder = ContinuumBuilder::new("s".repeat(64))?;
/// let sessions = builder.directives(
///     builder.refreshable(
///         StringSerializer,
///         Arc::new(InMemoryRefreshTokenStore::<String>::new()),
///     ),
///     builder.cookie_transport(),
/// );
/// let csrf = builder.csrf_guard()?;
/// # let _ = (sessions, csrf);
/// # Ok::<(), ContinuumError>(())
/// ```
pub struct ContinuumBuilder {
    secret: ServerSecret,
    clock: Arc<dyn Clock>,
    session_config: SessionConfig,
    cookie_config: CookieTransportConfig,
    header_config: HeaderTransportConfig,
    csrf_config: CsrfConfig,
}

impl ContinuumBuilder {
    /// Creates a builder with default settings.
    ///
    /// # Errors
    /// [`ContinuumError::Codec`] if the secret is shorter than
    /// [`MIN_SECRET_LEN`](continuum_codec::MIN_SECRET_LEN) bytes.
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, ContinuumError> {
        Ok(Self {
            secret: ServerSecret::new(secret)?,
            clock: Arc::new(SystemClock),
            session_config: SessionConfig::default(),
            cookie_config: CookieTransportConfig::default(),
            header_config: HeaderTransportConfig::default(),
            csrf_config: CsrfConfig::default(),
        })
    }

    /// Sets the time source (tests use a `ManualClock`).
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sets session lifetimes, token format and store retries.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets cookie names and attributes.
    pub fn cookie_config(mut self, config: CookieTransportConfig) -> Self {
        self.cookie_config = config;
        self
    }

    /// Sets header names.
    pub fn header_config(mut self, config: HeaderTransportConfig) -> Self {
        self.header_config = config;
        self
    }

    /// Sets the CSRF cookie and header.
    pub fn csrf_config(mut self, config: CsrfConfig) -> Self {
        self.csrf_config = config;
        self
    }

    /// A stateless session manager.
    pub fn one_off<S: SessionSerializer>(&self, serializer: S) -> OneOffManager<S> {
        OneOffManager::new(
            serializer,
            &self.secret,
            Arc::clone(&self.clock),
            self.session_config.clone(),
        )
    }

    /// A rotating session manager over `store`.
    pub fn refreshable<S, St>(&self, serializer: S, store: Arc<St>) -> RefreshManager<S, St>
    where
        S: SessionSerializer,
        S::Value: Clone,
        St: RefreshTokenStore<S::Value>,
    {
        RefreshManager::new(
            serializer,
            &self.secret,
            Arc::clone(&self.clock),
            store,
            self.session_config.clone(),
        )
    }

    /// A cookie transport with the configured cookies.
    pub fn cookie_transport(&self) -> CookieTransport {
        CookieTransport::new(self.cookie_config.clone())
    }

    /// A header transport with the configured headers.
    ///
    /// # Errors
    /// [`ContinuumError::Transport`] if a configured name is invalid.
    pub fn header_transport(&self) -> Result<HeaderTransport, ContinuumError> {
        Ok(HeaderTransport::new(self.header_config.clone())?)
    }

    /// A CSRF guard.
    ///
    /// # Errors
    /// [`ContinuumError::Csrf`] if the configured header name is invalid.
    pub fn csrf_guard(&self) -> Result<CsrfGuard, ContinuumError> {
        Ok(CsrfGuard::new(self.csrf_config.clone(), &self.secret)?)
    }

    /// Binds a session variant to a transport.
    pub fn directives<St, Tr>(&self, strategy: St, transport: Tr) -> SessionDirectives<St, Tr>
    where
        St: SessionStrategy,
        Tr: SessionTransport,
    {
        tracing::debug!(
            token_format = ?self.session_config.token_format,
            "session directives configured"
        );
        SessionDirectives::new(strategy, transport)
    }
}

impl std::fmt::Debug for ContinuumBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContinuumBuilder")
            .field("session_config", &self.session_config)
            .field("cookie_config", &self.cookie_config)
            .field("header_config", &self.header_config)
            .field("csrf_config", &self.csrf_config)
            .finish_non_exhaustive()
    }
}
