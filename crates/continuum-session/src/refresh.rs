//! The rotating session variant.
//!
//! A refresh session is two tokens:
//!
//! - a short-lived signed **session token**, verified on every request
//!   without touching the store (the fast path)
//! - a long-lived single-use **refresh token** (`selector:secret`), backed
//!   by a [`RefreshTokenRecord`], redeemed once the session token expires
//!
//! ## Rotation and theft detection
//!
//! ```text
//! login ──→ [record A] ──refresh(A)──→ [A consumed] + [record B] ──refresh(B)──→ ...
//!                                           │
//!                   refresh(A) again ───────┘──→ replay: revoke the whole lineage
//! ```
//!
//! Every redemption *takes* the record out of the store
//! ([`RefreshTokenStore::remove`]), so of two concurrent refreshes of the
//! same token exactly one gets the record and rotates it. The winner then
//! leaves a consumed tombstone behind. A loser gets
//! [`SessionError::NoSession`] either way: it finds no record, or it finds
//! a tombstone younger than [`SessionConfig::refresh_race_grace`] and puts
//! it back. Neither is treated as theft. Presenting the old token once the
//! grace window has passed revokes every token of that login.

use std::future::Future;
use std::sync::Arc;

use continuum_codec::{
    Clock, ServerSecret, SessionCodec, SessionSerializer, duration_millis, random_token,
};

use crate::token::RefreshToken;
use crate::{
    RefreshTokenRecord, RefreshTokenStore, Session, SessionConfig, SessionEnvelope, SessionError,
    StoreError, TokenPair,
};

/// Bytes of entropy in a lineage id.
const LINEAGE_BYTES: usize = 16;

/// Log target for theft and replay events.
const SECURITY_TARGET: &str = "continuum::security";

/// The result of redeeming a refresh token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renewed<T> {
    /// The restored session, with [`SessionOrigin::Refresh`](crate::SessionOrigin::Refresh).
    pub session: Session<T>,
    /// The replacement token pair. The redeemed refresh token is dead.
    pub tokens: TokenPair,
}

/// Issues, verifies, rotates and revokes refresh sessions.
///
/// The store is injected at construction and shared through an `Arc`, so
/// the application can keep its own handle (for purging, or inspection in
/// tests).
pub struct RefreshManager<S: SessionSerializer, St> {
    codec: SessionCodec<SessionEnvelope<S>>,
    store: Arc<St>,
    config: SessionConfig,
}

impl<S, St> RefreshManager<S, St>
where
    S: SessionSerializer,
    S::Value: Clone,
    St: RefreshTokenStore<S::Value>,
{
    /// Creates a manager over `store`.
    pub fn new(
        serializer: S,
        secret: &ServerSecret,
        clock: Arc<dyn Clock>,
        store: Arc<St>,
        config: SessionConfig,
    ) -> Self {
        let codec = SessionCodec::with_format(
            SessionEnvelope(serializer),
            secret,
            config.token_format,
            clock,
        );
        Self {
            codec,
            store,
            config,
        }
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<St> {
        &self.store
    }

    /// The configuration this manager was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    fn now(&self) -> u64 {
        self.codec.clock().now_millis()
    }

    // -----------------------------------------------------------------------
    // Issuing
    // -----------------------------------------------------------------------

    /// Logs `data` in: a new lineage, a session token and a refresh token.
    ///
    /// # Errors
    /// [`SessionError::Codec`] if the payload can't be serialized,
    /// [`SessionError::Store`] if the record can't be written.
    pub async fn login(&self, data: S::Value) -> Result<TokenPair, SessionError> {
        let lineage = random_token::<LINEAGE_BYTES>();
        let tokens = self.issue_pair(&Session::login(data), lineage.clone()).await?;
        tracing::info!(%lineage, "refresh session created");
        Ok(tokens)
    }

    /// Signs `session` into a session token valid for `session_max_age`.
    ///
    /// Used to re-sign a changed payload without rotating the refresh
    /// token.
    pub fn sign(&self, session: &Session<S::Value>) -> Result<String, SessionError> {
        let expires_at = self.now() + duration_millis(self.config.session_max_age);
        Ok(self.codec.encode(session, expires_at)?)
    }

    async fn issue_pair(
        &self,
        session: &Session<S::Value>,
        lineage: String,
    ) -> Result<TokenPair, SessionError> {
        let session_token = self.sign(session)?;

        let refresh = RefreshToken::generate();
        let record = RefreshTokenRecord {
            selector: refresh.selector().to_owned(),
            token_hash: refresh.secret_hash(),
            payload: session.data.clone(),
            expires_at: self.now() + duration_millis(self.config.refresh_max_age),
            lineage,
            consumed_at: None,
        };

        let store = &*self.store;
        self.with_retries("put", move || store.put(record.clone()))
            .await?;

        Ok(TokenPair {
            session: session_token,
            refresh: refresh.to_string(),
        })
    }

    // -----------------------------------------------------------------------
    // Verifying
    // -----------------------------------------------------------------------

    /// Decodes a session token, or `None` if it is unusable for any reason.
    pub fn read(&self, session_token: &str) -> Option<Session<S::Value>> {
        match self.codec.decode(session_token) {
            Ok(session) => Some(session),
            Err(e) => {
                tracing::debug!(error = %e, "rejected session token");
                None
            }
        }
    }

    /// Authenticates a request without rotating anything.
    ///
    /// A valid session token wins. Otherwise the refresh token is checked
    /// against its record; a wrong secret or a reused one revokes the
    /// lineage, an expired record is removed.
    ///
    /// # Errors
    /// [`SessionError::NoSession`] whenever the request isn't
    /// authenticated, including when the store stays unavailable.
    pub async fn authenticate(
        &self,
        session_token: Option<&str>,
        refresh_token: Option<&str>,
    ) -> Result<Session<S::Value>, SessionError> {
        if let Some(session) = session_token.and_then(|t| self.read(t)) {
            return Ok(session);
        }

        let token = parse(refresh_token)?;
        let selector = token.selector();
        let store = &*self.store;
        let record = self
            .with_retries("get", move || store.get(selector))
            .await
            .map_err(unavailable)?
            .ok_or_else(|| {
                tracing::debug!(%selector, "unknown refresh token");
                SessionError::NoSession
            })?;

        if self.superseded(&token, &record) {
            return Err(SessionError::NoSession);
        }
        self.verify(&token, &record).await?;

        if record.is_expired(self.now()) {
            tracing::debug!(%selector, "refresh token expired");
            if let Err(e) = self.with_retries("remove", move || store.remove(selector)).await {
                tracing::warn!(%selector, error = %e, "failed to remove expired refresh token");
            }
            return Err(SessionError::NoSession);
        }

        Ok(Session::refreshed(record.payload))
    }

    /// Redeems a refresh token for a new token pair.
    ///
    /// The presented token is dead afterwards: presenting it again is
    /// treated as a replay and revokes every token of the login.
    ///
    /// # Errors
    /// [`SessionError::NoSession`] if the token is unknown, expired,
    /// already used, has the wrong secret, or the store is unavailable.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Renewed<S::Value>, SessionError> {
        let token = parse(Some(refresh_token))?;
        let selector = token.selector();
        let store = &*self.store;

        // Taking the record is the linearization point.
        let record = self
            .with_retries("remove", move || store.remove(selector))
            .await
            .map_err(unavailable)?
            .ok_or_else(|| {
                tracing::debug!(%selector, "unknown refresh token");
                SessionError::NoSession
            })?;

        if self.superseded(&token, &record) {
            // Put the tombstone back so a later replay is still caught.
            if let Err(e) = self.with_retries("put", move || store.put(record.clone())).await {
                tracing::warn!(%selector, error = %e, "failed to restore consumed refresh token");
            }
            return Err(SessionError::NoSession);
        }
        self.verify(&token, &record).await?;

        if record.is_expired(self.now()) {
            tracing::debug!(%selector, "refresh token expired");
            return Err(SessionError::NoSession);
        }

        let session = Session::refreshed(record.payload.clone());
        let tokens = self
            .issue_pair(&session, record.lineage.clone())
            .await
            .map_err(|e| {
                tracing::warn!(%selector, error = %e, "failed to issue rotated refresh token");
                SessionError::NoSession
            })?;

        let lineage = record.lineage.clone();
        let tombstone = RefreshTokenRecord {
            consumed_at: Some(self.now()),
            ..record
        };
        if let Err(e) = self
            .with_retries("put", move || store.put(tombstone.clone()))
            .await
        {
            // The rotation still stands; only replay detection for the
            // old token is lost.
            tracing::warn!(%selector, error = %e, "failed to record consumed refresh token");
        }

        tracing::info!(%lineage, "refresh token rotated");
        Ok(Renewed { session, tokens })
    }

    /// `true` for the right secret presented against a tombstone written
    /// less than `refresh_race_grace` ago: a concurrent request already
    /// rotated this token.
    fn superseded(&self, token: &RefreshToken, record: &RefreshTokenRecord<S::Value>) -> bool {
        let Some(consumed_at) = record.consumed_at else {
            return false;
        };
        let grace = duration_millis(self.config.refresh_race_grace);
        if self.now().saturating_sub(consumed_at) >= grace || !token.matches(&record.token_hash) {
            return false;
        }
        tracing::debug!(
            selector = %record.selector,
            lineage = %record.lineage,
            "refresh token already rotated by a concurrent request"
        );
        true
    }

    /// Checks a presented token against its record, revoking the lineage
    /// on a wrong secret or a reused token.
    async fn verify(
        &self,
        token: &RefreshToken,
        record: &RefreshTokenRecord<S::Value>,
    ) -> Result<(), SessionError> {
        if !token.matches(&record.token_hash) {
            self.revoke(record, "secret mismatch").await;
            return Err(SessionError::NoSession);
        }
        if record.is_consumed() {
            self.revoke(record, "refresh token replayed").await;
            return Err(SessionError::NoSession);
        }
        Ok(())
    }

    async fn revoke(&self, record: &RefreshTokenRecord<S::Value>, reason: &'static str) {
        tracing::warn!(
            target: SECURITY_TARGET,
            selector = %record.selector,
            lineage = %record.lineage,
            reason,
            "possible refresh token theft, revoking lineage"
        );
        let store = &*self.store;
        let lineage = record.lineage.as_str();
        if let Err(e) = self.with_retries("remove_all", move || store.remove_all(lineage)).await {
            tracing::error!(
                target: SECURITY_TARGET,
                %lineage,
                error = %e,
                "failed to revoke refresh token lineage"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Ending
    // -----------------------------------------------------------------------

    /// Logs out the login `refresh_token` belongs to, removing every
    /// record of its lineage.
    ///
    /// Unknown or malformed tokens are a no-op, so logging out twice is
    /// fine.
    ///
    /// # Errors
    /// [`SessionError::Store`] if the store stays unavailable.
    pub async fn logout(&self, refresh_token: &str) -> Result<(), SessionError> {
        let Some(token) = RefreshToken::parse(refresh_token) else {
            return Ok(());
        };
        let selector = token.selector();
        let store = &*self.store;

        let Some(record) = self.with_retries("get", move || store.get(selector)).await? else {
            tracing::debug!(%selector, "logout with unknown refresh token");
            return Ok(());
        };

        let lineage = record.lineage.as_str();
        let removed = self
            .with_retries("remove_all", move || store.remove_all(lineage))
            .await?;
        tracing::info!(%lineage, removed, "refresh session ended");
        Ok(())
    }

    /// Drops every expired record from the store.
    pub async fn purge_expired(&self) -> Result<usize, SessionError> {
        let now = self.now();
        let store = &*self.store;
        let removed = self
            .with_retries("remove_expired", move || store.remove_expired(now))
            .await?;
        if removed > 0 {
            tracing::debug!(removed, "purged expired refresh tokens");
        }
        Ok(removed)
    }

    /// Runs a store call, retrying transient failures up to
    /// `store_retries` times.
    async fn with_retries<R, F, Fut>(&self, op: &'static str, mut call: F) -> Result<R, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if e.is_transient() && attempt < self.config.store_retries => {
                    attempt += 1;
                    tracing::debug!(op, attempt, error = %e, "retrying store operation");
                    tokio::time::sleep(self.config.store_retry_delay).await;
                }
                result => return result,
            }
        }
    }
}

fn parse(raw: Option<&str>) -> Result<RefreshToken, SessionError> {
    raw.and_then(RefreshToken::parse).ok_or_else(|| {
        tracing::debug!("missing or malformed refresh token");
        SessionError::NoSession
    })
}

fn unavailable(e: StoreError) -> SessionError {
    tracing::warn!(error = %e, "refresh token store unavailable");
    SessionError::NoSession
}
