//! Session timing and retry configuration.

use std::time::Duration;

use continuum_codec::TokenFormat;

/// Configuration shared by both session managers.
///
/// Sensible defaults are provided; override just the fields you care
/// about:
///
/// ```rust
/// use std::time::Duration;
/// use continuum_session::SessionConfig;
///
/// let config = SessionConfig {
///     session_max_age: Duration::from_secs(15 * 60),
///     ..SessionConfig::default()
/// };
/// assert_eq!(config.store_retries, 2);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a signed session token.
    ///
    /// For the one-off variant this is the whole session. For the refresh
    /// variant it is the window in which requests are verified without
    /// touching the store. Default: 7 days.
    pub session_max_age: Duration,

    /// Lifetime of a refresh token record. Default: 30 days.
    pub refresh_max_age: Duration,

    /// Layout of issued session tokens. Default: [`TokenFormat::Basic`].
    pub token_format: TokenFormat,

    /// How many times a transient store failure is retried before the
    /// request is refused. Default: 2.
    pub store_retries: u32,

    /// Pause between store retries. Default: 10 ms.
    pub store_retry_delay: Duration,

    /// How long after a rotation the old refresh token is treated as a
    /// concurrent request that lost the race rather than a replay. Within
    /// the window it is refused without revoking anything; after it, reuse
    /// revokes the whole login. Default: 10 s.
    pub refresh_race_grace: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            session_max_age: Duration::from_secs(7 * 24 * 60 * 60),
            refresh_max_age: Duration::from_secs(30 * 24 * 60 * 60),
            token_format: TokenFormat::Basic,
            store_retries: 2,
            store_retry_delay: Duration::from_millis(10),
            refresh_race_grace: Duration::from_secs(10),
        }
    }
}
