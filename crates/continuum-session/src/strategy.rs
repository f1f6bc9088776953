//! One interface over both session variants.
//!
//! The HTTP-facing layer doesn't care whether sessions rotate. It asks a
//! [`SessionStrategy`] to issue tokens, authenticate the tokens a request
//! carried, and invalidate them. The variant is picked once, at
//! construction, by choosing which manager to hand over.

use std::future::Future;

use continuum_codec::SessionSerializer;

use crate::{
    Authenticated, IssuedTokens, OneOffManager, PresentedTokens, RefreshManager,
    RefreshTokenStore, Renewed, Session, SessionError,
};

/// A session variant: stateless ([`OneOffManager`]) or rotating
/// ([`RefreshManager`]).
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → one strategy serves every request task for
///   the lifetime of the process.
/// - Returned futures are `Send` so handlers stay spawnable.
pub trait SessionStrategy: Send + Sync + 'static {
    /// The session payload type.
    type Data: Send + Sync + 'static;

    /// Starts a session for `data` (a login).
    fn issue(
        &self,
        data: Self::Data,
    ) -> impl Future<Output = Result<IssuedTokens, SessionError>> + Send;

    /// Authenticates the tokens a request carried.
    ///
    /// Rotating strategies may renew the session here; the new tokens come
    /// back in [`Authenticated::renewed`] and must reach the client.
    fn authenticate(
        &self,
        presented: PresentedTokens<'_>,
    ) -> impl Future<Output = Result<Authenticated<Self::Data>, SessionError>> + Send;

    /// Re-signs the session token for an existing session (for a changed
    /// payload, or a sliding expiry). Never touches server-side state.
    fn reissue(&self, session: &Session<Self::Data>) -> Result<IssuedTokens, SessionError>;

    /// Ends the session the presented tokens belong to.
    fn invalidate(
        &self,
        presented: PresentedTokens<'_>,
    ) -> impl Future<Output = Result<(), SessionError>> + Send;
}

// ---------------------------------------------------------------------------
// Stateless
// ---------------------------------------------------------------------------

impl<S: SessionSerializer> SessionStrategy for OneOffManager<S> {
    type Data = S::Value;

    async fn issue(&self, data: S::Value) -> Result<IssuedTokens, SessionError> {
        Ok(IssuedTokens {
            session: self.sign(&Session::login(data))?,
            refresh: None,
        })
    }

    async fn authenticate(
        &self,
        presented: PresentedTokens<'_>,
    ) -> Result<Authenticated<S::Value>, SessionError> {
        let token = presented.session.ok_or(SessionError::NoSession)?;
        Ok(Authenticated {
            session: self.read(token)?,
            renewed: None,
        })
    }

    fn reissue(&self, session: &Session<S::Value>) -> Result<IssuedTokens, SessionError> {
        Ok(IssuedTokens {
            session: self.sign(session)?,
            refresh: None,
        })
    }

    // Nothing is stored server-side; clearing the carrier is all there is.
    async fn invalidate(&self, _presented: PresentedTokens<'_>) -> Result<(), SessionError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Rotating
// ---------------------------------------------------------------------------

impl<S, St> SessionStrategy for RefreshManager<S, St>
where
    S: SessionSerializer,
    S::Value: Clone,
    St: RefreshTokenStore<S::Value>,
{
    type Data = S::Value;

    async fn issue(&self, data: S::Value) -> Result<IssuedTokens, SessionError> {
        Ok(self.login(data).await?.into())
    }

    async fn authenticate(
        &self,
        presented: PresentedTokens<'_>,
    ) -> Result<Authenticated<S::Value>, SessionError> {
        if let Some(session) = presented.session.and_then(|t| self.read(t)) {
            return Ok(Authenticated {
                session,
                renewed: None,
            });
        }

        let refresh = presented.refresh.ok_or(SessionError::NoSession)?;
        let Renewed { session, tokens } = self.refresh(refresh).await?;
        Ok(Authenticated {
            session,
            renewed: Some(tokens.into()),
        })
    }

    fn reissue(&self, session: &Session<S::Value>) -> Result<IssuedTokens, SessionError> {
        Ok(IssuedTokens {
            session: self.sign(session)?,
            refresh: None,
        })
    }

    async fn invalidate(&self, presented: PresentedTokens<'_>) -> Result<(), SessionError> {
        match presented.refresh {
            Some(refresh) => self.logout(refresh).await,
            None => Ok(()),
        }
    }
}
