//! Persistence seam for refresh tokens.
//!
//! The refresh manager never talks to a database directly. It goes
//! through [`RefreshTokenStore`], so the same rotation logic runs against
//! the bundled [`InMemoryRefreshTokenStore`](crate::InMemoryRefreshTokenStore),
//! a SQL table, Redis, or a mock in tests.

use std::future::Future;

use crate::StoreError;

/// One persisted refresh token.
///
/// Records sharing a `lineage` descend from the same login. Revoking a
/// lineage logs that login out everywhere it was rotated to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord<T> {
    /// Lookup key, the first half of `selector:secret`.
    pub selector: String,

    /// SHA-256 of the secret half. The secret itself is never stored.
    pub token_hash: String,

    /// The session payload to restore on refresh.
    pub payload: T,

    /// Expiry as unix milliseconds.
    pub expires_at: u64,

    /// Identifier shared by every rotation of one login.
    pub lineage: String,

    /// When the token was redeemed, as unix milliseconds. A consumed
    /// record is kept only so that a second presentation can be recognised
    /// as a replay, or as a concurrent request that lost the race.
    pub consumed_at: Option<u64>,
}

impl<T> RefreshTokenRecord<T> {
    /// `true` once the token has been redeemed.
    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// `true` once `now` has reached the expiry.
    pub fn is_expired(&self, now: u64) -> bool {
        self.expires_at <= now
    }
}

/// Storage backend for refresh token records.
///
/// # Contract
///
/// - `remove` must be atomic: when several callers remove the same
///   selector concurrently, exactly one of them gets `Some(record)`. The
///   refresh manager relies on this to make each token single-use.
/// - Every method may fail with [`StoreError::Transient`] (retried by the
///   caller) or [`StoreError::Permanent`] (not retried).
///
/// # Trait bounds
///
/// - `Send + Sync + 'static` → a store is shared by every request task.
/// - Returned futures are `Send` so managers can be driven from any
///   Tokio worker thread.
pub trait RefreshTokenStore<T>: Send + Sync + 'static {
    /// Inserts or overwrites the record under `record.selector`.
    fn put(
        &self,
        record: RefreshTokenRecord<T>,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Looks up a record without modifying it.
    fn get(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<RefreshTokenRecord<T>>, StoreError>> + Send;

    /// Removes and returns the record under `selector`.
    fn remove(
        &self,
        selector: &str,
    ) -> impl Future<Output = Result<Option<RefreshTokenRecord<T>>, StoreError>> + Send;

    /// Removes every record of a lineage. Returns how many were removed.
    fn remove_all(&self, lineage: &str) -> impl Future<Output = Result<usize, StoreError>> + Send;

    /// Removes every record that expired at or before `now`. Returns how
    /// many were removed.
    fn remove_expired(&self, now: u64) -> impl Future<Output = Result<usize, StoreError>> + Send;
}
