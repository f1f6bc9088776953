//! Integration tests for refresh rotation against real and failing stores.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use continuum_codec::{ManualClock, MapSerializer, ServerSecret, StringSerializer};
use continuum_session::{
    InMemoryRefreshTokenStore, PresentedTokens, RefreshManager, RefreshTokenRecord,
    RefreshTokenStore, SessionConfig, SessionError, SessionStrategy, StoreError,
};
use futures_util::future::join_all;

// =========================================================================
// Helpers
// =========================================================================

fn secret() -> ServerSecret {
    ServerSecret::new(b"c0ntinuum-integration-test-secret-that-is-long-enough-to-be-accepted!").unwrap()
}

fn config() -> SessionConfig {
    SessionConfig {
        session_max_age: Duration::from_secs(60),
        refresh_max_age: Duration::from_secs(24 * 60 * 60),
        store_retry_delay: Duration::from_millis(1),
        ..SessionConfig::default()
    }
}

/// Fails the next `failures` calls with the given error, then delegates.
struct FlakyStore {
    inner: InMemoryRefreshTokenStore<String>,
    failures: AtomicU32,
    error: StoreError,
    calls: AtomicU32,
}

impl FlakyStore {
    fn new(failures: u32, error: StoreError) -> Self {
        Self {
            inner: InMemoryRefreshTokenStore::new(),
            failures: AtomicU32::new(failures),
            error,
            calls: AtomicU32::new(0),
        }
    }

    fn fail_next(&self, n: u32) {
        self.failures.store(n, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(self.error.clone());
        }
        Ok(())
    }
}

impl RefreshTokenStore<String> for FlakyStore {
    async fn put(&self, record: RefreshTokenRecord<String>) -> Result<(), StoreError> {
        self.check()?;
        self.inner.put(record).await
    }

    async fn get(&self, selector: &str) -> Result<Option<RefreshTokenRecord<String>>, StoreError> {
        self.check()?;
        self.inner.get(selector).await
    }

    async fn remove(
        &self,
        selector: &str,
    ) -> Result<Option<RefreshTokenRecord<String>>, StoreError> {
        self.check()?;
        self.inner.remove(selector).await
    }

    async fn remove_all(&self, lineage: &str) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.remove_all(lineage).await
    }

    async fn remove_expired(&self, now: u64) -> Result<usize, StoreError> {
        self.check()?;
        self.inner.remove_expired(now).await
    }
}

fn selector_of(refresh: &str) -> &str {
    refresh.split(':').next().unwrap()
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test]
async fn test_concurrent_refresh_exactly_one_succeeds() {
    let clock = Arc::new(ManualClock::new(5_000_000));
    let store = Arc::new(InMemoryRefreshTokenStore::<String>::new());
    let mgr = Arc::new(RefreshManager::new(
        StringSerializer,
        &secret(),
        clock,
        store.clone(),
        config(),
    ));
    let tokens = mgr.login("alice".into()).await.unwrap();

    let attempts = (0..8).map(|_| {
        let mgr = mgr.clone();
        let refresh = tokens.refresh.clone();
        tokio::spawn(async move { mgr.refresh(&refresh).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1, "exactly one refresh may rotate the token");

    // The losers are not theft: the winner's record and the tombstone of
    // the spent token are both still there, and the winner's token works.
    assert_eq!(store.len().await, 2);
    let next = mgr.refresh(&winners[0].tokens.refresh).await.unwrap();
    assert_eq!(next.session.data, "alice");
}

#[tokio::test]
async fn test_concurrent_strategy_authenticate_renews_once_without_revoking() {
    let clock = Arc::new(ManualClock::new(5_000_000));
    let mgr = Arc::new(RefreshManager::new(
        StringSerializer,
        &secret(),
        clock.clone(),
        Arc::new(InMemoryRefreshTokenStore::<String>::new()),
        config(),
    ));
    let tokens = mgr.login("alice".into()).await.unwrap();
    clock.advance(Duration::from_secs(120));

    // Parallel requests carrying the same expired session token.
    let attempts = (0..4).map(|_| {
        let mgr = mgr.clone();
        let tokens = tokens.clone();
        tokio::spawn(async move {
            let presented = PresentedTokens {
                session: Some(&tokens.session),
                refresh: Some(&tokens.refresh),
            };
            SessionStrategy::authenticate(&*mgr, presented).await
        })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let renewed: Vec<_> = results
        .iter()
        .filter_map(|r| r.as_ref().ok())
        .filter_map(|auth| auth.renewed.clone())
        .collect();
    assert_eq!(renewed.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, SessionError::NoSession)));

    let refresh = renewed[0].refresh.clone().unwrap();
    assert_eq!(mgr.refresh(&refresh).await.unwrap().session.data, "alice");
}

// =========================================================================
// Store failures
// =========================================================================

#[tokio::test]
async fn test_refresh_transient_failures_are_retried() {
    let clock = Arc::new(ManualClock::new(5_000_000));
    let store = Arc::new(FlakyStore::new(0, StoreError::Transient("timeout".into())));
    let mgr = RefreshManager::new(StringSerializer, &secret(), clock, store.clone(), config());
    let tokens = mgr.login("alice".into()).await.unwrap();

    store.fail_next(2);
    let renewed = mgr.refresh(&tokens.refresh).await.unwrap();
    assert_eq!(renewed.session.data, "alice");
}

#[tokio::test]
async fn test_refresh_store_down_fails_closed() {
    let clock = Arc::new(ManualClock::new(5_000_000));
    let store = Arc::new(FlakyStore::new(0, StoreError::Transient("timeout".into())));
    let mgr = RefreshManager::new(StringSerializer, &secret(), clock, store.clone(), config());
    let tokens = mgr.login("alice".into()).await.unwrap();

    store.fail_next(3);
    assert!(matches!(
        mgr.refresh(&tokens.refresh).await,
        Err(SessionError::NoSession)
    ));

    // The record was never taken, so the token survives the outage.
    assert!(mgr.refresh(&tokens.refresh).await.is_ok());
}

#[tokio::test]
async fn test_permanent_failure_is_not_retried() {
    let clock = Arc::new(ManualClock::new(5_000_000));
    let store = Arc::new(FlakyStore::new(0, StoreError::Permanent("disk full".into())));
    let mgr = RefreshManager::new(StringSerializer, &secret(), clock, store.clone(), config());

    store.fail_next(1);
    let before = store.calls.load(Ordering::SeqCst);
    let result = mgr.login("alice".into()).await;

    assert!(matches!(result, Err(SessionError::Store(StoreError::Permanent(_)))));
    assert_eq!(store.calls.load(Ordering::SeqCst) - before, 1);
}

// =========================================================================
// Through the strategy interface
// =========================================================================

#[tokio::test]
async fn test_strategy_silent_renewal_after_session_expiry() {
    let clock = Arc::new(ManualClock::new(5_000_000));
    let mgr = RefreshManager::new(
        MapSerializer,
        &secret(),
        clock.clone(),
        Arc::new(InMemoryRefreshTokenStore::<HashMap<String, String>>::new()),
        config(),
    );
    let data: HashMap<String, String> = [("value".to_string(), "alice".to_string())].into();
    let issued = SessionStrategy::issue(&mgr, data).await.unwrap();
    let refresh = issued.refresh.clone().unwrap();

    clock.advance(Duration::from_secs(120));
    let auth = SessionStrategy::authenticate(
        &mgr,
        PresentedTokens {
            session: Some(&issued.session),
            refresh: Some(&refresh),
        },
    )
    .await
    .unwrap();

    assert_eq!(auth.session.data["value"], "alice");
    assert!(auth.session.was_refreshed());
    let renewed = auth.renewed.expect("expired session must be renewed");
    assert_ne!(
        selector_of(renewed.refresh.as_deref().unwrap()),
        selector_of(&refresh)
    );
}

#[tokio::test]
async fn test_strategy_invalidate_then_authenticate_fails() {
    let clock = Arc::new(ManualClock::new(5_000_000));
    let mgr = RefreshManager::new(
        StringSerializer,
        &secret(),
        clock.clone(),
        Arc::new(InMemoryRefreshTokenStore::<String>::new()),
        config(),
    );
    let issued = SessionStrategy::issue(&mgr, "alice".into()).await.unwrap();
    let presented = PresentedTokens {
        session: None,
        refresh: issued.refresh.as_deref(),
    };

    SessionStrategy::invalidate(&mgr, presented).await.unwrap();
    assert!(matches!(
        SessionStrategy::authenticate(&mgr, presented).await,
        Err(SessionError::NoSession)
    ));
}
