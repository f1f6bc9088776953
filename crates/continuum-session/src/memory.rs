//! In-process refresh token store.
//!
//! Good for tests, demos, and single-instance deployments. Anything that
//! runs more than one server process needs a shared store instead.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{RefreshTokenRecord, RefreshTokenStore, StoreError};

/// A [`RefreshTokenStore`] backed by a `HashMap` behind a Tokio mutex.
///
/// Every operation holds the lock for its whole duration, which is what
/// makes `remove` atomic.
///
/// Nothing is evicted on its own. Every rotation leaves a consumed record
/// behind until its expiry, so the application must call
/// [`RefreshManager::purge_expired`](crate::RefreshManager::purge_expired)
/// periodically (from a `tokio::time::interval` task, say) to keep the map
/// from growing.
pub struct InMemoryRefreshTokenStore<T> {
    records: Mutex<HashMap<String, RefreshTokenRecord<T>>>,
}

impl<T> InMemoryRefreshTokenStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Number of records held, consumed tombstones included.
    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Returns `true` if the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.lock().await.is_empty()
    }
}

impl<T> Default for InMemoryRefreshTokenStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RefreshTokenStore<T> for InMemoryRefreshTokenStore<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn put(&self, record: RefreshTokenRecord<T>) -> Result<(), StoreError> {
        tracing::debug!(selector = %record.selector, lineage = %record.lineage, "storing refresh token");
        self.records
            .lock()
            .await
            .insert(record.selector.clone(), record);
        Ok(())
    }

    async fn get(&self, selector: &str) -> Result<Option<RefreshTokenRecord<T>>, StoreError> {
        Ok(self.records.lock().await.get(selector).cloned())
    }

    async fn remove(&self, selector: &str) -> Result<Option<RefreshTokenRecord<T>>, StoreError> {
        let removed = self.records.lock().await.remove(selector);
        if removed.is_some() {
            tracing::debug!(%selector, "removed refresh token");
        }
        Ok(removed)
    }

    async fn remove_all(&self, lineage: &str) -> Result<usize, StoreError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| record.lineage != lineage);
        let removed = before - records.len();
        tracing::debug!(%lineage, removed, "removed refresh token lineage");
        Ok(removed)
    }

    async fn remove_expired(&self, now: u64) -> Result<usize, StoreError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|_, record| !record.is_expired(now));
        Ok(before - records.len())
    }
}
