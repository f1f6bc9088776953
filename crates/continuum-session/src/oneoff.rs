//! The stateless session variant.
//!
//! A one-off session is nothing but a signed token. There is no server
//! state to consult or clean up: the token is valid until it expires and
//! "logging out" means asking the client to forget it.

use std::sync::Arc;

use continuum_codec::{Clock, ServerSecret, SessionCodec, SessionSerializer, duration_millis};

use crate::{Session, SessionConfig, SessionEnvelope, SessionError};

/// Issues and reads fixed-expiry session tokens.
pub struct OneOffManager<S: SessionSerializer> {
    codec: SessionCodec<SessionEnvelope<S>>,
    config: SessionConfig,
}

impl<S: SessionSerializer> OneOffManager<S> {
    /// Creates a manager signing with `secret` and checking expiry
    /// against `clock`.
    pub fn new(
        serializer: S,
        secret: &ServerSecret,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let codec = SessionCodec::with_format(
            SessionEnvelope(serializer),
            secret,
            config.token_format,
            clock,
        );
        Self { codec, config }
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Issues a token for `data`, valid for `session_max_age`.
    ///
    /// # Errors
    /// [`SessionError::Codec`] if the payload can't be serialized.
    pub fn issue(&self, data: S::Value) -> Result<String, SessionError> {
        self.sign(&Session::login(data))
    }

    /// Re-signs an existing session with a fresh expiry, keeping its
    /// origin.
    pub fn sign(&self, session: &Session<S::Value>) -> Result<String, SessionError> {
        let expires_at =
            self.codec.clock().now_millis() + duration_millis(self.config.session_max_age);
        Ok(self.codec.encode(session, expires_at)?)
    }

    /// Reads a token back.
    ///
    /// # Errors
    /// [`SessionError::NoSession`] for every kind of codec failure.
    pub fn read(&self, token: &str) -> Result<Session<S::Value>, SessionError> {
        self.codec.decode(token).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            SessionError::NoSession
        })
    }
}
