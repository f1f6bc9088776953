//! Time source for expiry checks.
//!
//! Every expiry in Continuum is an absolute wall-clock timestamp in unix
//! milliseconds, because tokens travel to clients and back and must stay
//! meaningful across process restarts. `Instant` cannot do that.
//!
//! Components never read the system clock directly; they hold an
//! `Arc<dyn Clock>`. Production code uses [`SystemClock`]; tests use
//! [`ManualClock`] to jump past an expiry without sleeping.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A source of "now" in unix milliseconds.
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds since the unix epoch.
    fn now_millis(&self) -> u64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        // A clock set before 1970 is treated as the epoch itself; every
        // token then looks far in the future relative to it, which only
        // matters on a badly broken host.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| duration_millis(d))
            .unwrap_or(0)
    }
}

/// A clock that only moves when told to.
///
/// ```rust
/// use std::time::Duration;
/// use continuum_codec::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(Duration::from_secs(2));
/// assert_eq!(clock.now_millis(), 3_000);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `now_millis`.
    pub fn new(now_millis: u64) -> Self {
        Self {
            now: AtomicU64::new(now_millis),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(duration_millis(by), Ordering::SeqCst);
    }

    /// Sets the clock to an absolute value.
    pub fn set(&self, now_millis: u64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Converts a duration to whole milliseconds, saturating at `u64::MAX`.
pub fn duration_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
