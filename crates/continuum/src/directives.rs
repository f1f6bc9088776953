//! Session operations a router binds to routes.
//!
//! [`SessionDirectives`] pairs a [`SessionStrategy`] (what a session is)
//! with a [`SessionTransport`] (how its tokens travel). Handlers call it
//! with the request headers they received and the response headers they
//! are building:
//!
//! ```text
//! POST /login    → set_session(data)            → Set-Cookie / Set-Authorization
//! GET  /me       → require_session()            → Session<T> or 401
//! POST /logout   → invalidate_session()         → cleared carriers
//! ```

use continuum_session::{
    IssuedTokens, PresentedTokens, Session, SessionError, SessionStrategy,
};
use continuum_transport::{SessionTransport, Slot, TransportError};
use http::HeaderMap;

use crate::ContinuumError;

/// A session variant bound to a transport.
pub struct SessionDirectives<St, Tr> {
    strategy: St,
    transport: Tr,
}

impl<St: SessionStrategy, Tr: SessionTransport> SessionDirectives<St, Tr> {
    /// Binds `strategy` to `transport`.
    pub fn new(strategy: St, transport: Tr) -> Self {
        Self {
            strategy,
            transport,
        }
    }

    /// The session variant.
    pub fn strategy(&self) -> &St {
        &self.strategy
    }

    /// The token transport.
    pub fn transport(&self) -> &Tr {
        &self.transport
    }

    fn attach(&self, tokens: &IssuedTokens, response: &mut HeaderMap) -> Result<(), TransportError> {
        self.transport
            .attach_set(response, Slot::Session, &tokens.session)?;
        if let Some(refresh) = &tokens.refresh {
            self.transport.attach_set(response, Slot::Refresh, refresh)?;
        }
        Ok(())
    }

    /// Starts a session for `data` and attaches its tokens.
    ///
    /// # Errors
    /// [`ContinuumError::Session`] if the tokens can't be issued,
    /// [`ContinuumError::Transport`] if they can't be attached.
    pub async fn set_session(
        &self,
        data: St::Data,
        response: &mut HeaderMap,
    ) -> Result<(), ContinuumError> {
        let tokens = self.strategy.issue(data).await?;
        self.attach(&tokens, response)?;
        tracing::info!("session started");
        Ok(())
    }

    /// The request's session, if it has one.
    ///
    /// With a rotating strategy an expired session token is renewed here
    /// and the new tokens are attached to `response`. An unusable refresh
    /// token is left alone: it may belong to a parallel request that lost
    /// the renewal race, and clearing it could wipe the winner's cookie.
    ///
    /// # Errors
    /// Only for failures other than "no session" (store errors while
    /// renewing, unwritable tokens).
    pub async fn optional_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<Option<Session<St::Data>>, ContinuumError> {
        let session = self.transport.extract(request, Slot::Session);
        let refresh = self.transport.extract(request, Slot::Refresh);
        if session.is_none() && refresh.is_none() {
            return Ok(None);
        }

        let presented = PresentedTokens {
            session: session.as_deref(),
            refresh: refresh.as_deref(),
        };
        match self.strategy.authenticate(presented).await {
            Ok(auth) => {
                if let Some(renewed) = &auth.renewed {
                    self.attach(renewed, response)?;
                    tracing::debug!("session renewed");
                }
                Ok(Some(auth.session))
            }
            Err(SessionError::NoSession) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// The request's session.
    ///
    /// # Errors
    /// [`SessionError::NoSession`] (401) if there isn't one.
    pub async fn require_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<Session<St::Data>, ContinuumError> {
        self.optional_session(request, response)
            .await?
            .ok_or(ContinuumError::Session(SessionError::NoSession))
    }

    /// The request's session, only if its token came from a login rather
    /// than a refresh (step-up for sensitive routes).
    ///
    /// # Errors
    /// [`SessionError::NoSession`] (401) if there is no session or it was
    /// renewed from a refresh token.
    pub async fn require_login_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<Session<St::Data>, ContinuumError> {
        let session = self.require_session(request, response).await?;
        if session.was_refreshed() {
            tracing::debug!("refreshed session refused on login-only route");
            return Err(SessionError::NoSession.into());
        }
        Ok(session)
    }

    /// Ends the request's session and clears its carriers.
    ///
    /// Server-side revocation failures are logged but the carriers are
    /// cleared regardless.
    ///
    /// # Errors
    /// [`ContinuumError::Transport`] if the clear can't be written.
    pub async fn invalidate_session(
        &self,
        request: &HeaderMap,
        response: &mut HeaderMap,
    ) -> Result<(), ContinuumError> {
        let session = self.transport.extract(request, Slot::Session);
        let refresh = self.transport.extract(request, Slot::Refresh);
        let presented = PresentedTokens {
            session: session.as_deref(),
            refresh: refresh.as_deref(),
        };

        if let Err(e) = self.strategy.invalidate(presented).await {
            tracing::warn!(error = %e, "failed to revoke session server-side");
        }

        self.transport.attach_clear(response, Slot::Session)?;
        if refresh.is_some() {
            self.transport.attach_clear(response, Slot::Refresh)?;
        }
        tracing::info!("session invalidated");
        Ok(())
    }

    /// Re-signs `session` (after the handler changed its payload) and
    /// attaches the new session token. The refresh token is untouched.
    ///
    /// # Errors
    /// [`ContinuumError::Session`] if the payload can't be encoded.
    pub fn touch_session(
        &self,
        session: &Session<St::Data>,
        response: &mut HeaderMap,
    ) -> Result<(), ContinuumError> {
        let tokens = self.strategy.reissue(session)?;
        self.attach(&tokens, response)?;
        Ok(())
    }
}
