//! Cache records and freshness policy.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Floor for the derived prewarm interval.
const PREWARM_FLOOR: Duration = Duration::from_secs(30);

/// Freshness policy for one cache.
///
/// `ttl == 0` disables caching uniformly: records are born expired, so
/// every request takes the synchronous-refresh path and prewarming is
/// off.
///
/// ```rust
/// # use orrery::CachePolicy;
/// # use std::time::Duration;
/// let policy = CachePolicy::new(Duration::from_secs(120))
///     .stale_window(Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct CachePolicy {
    /// Time-to-live of a record.
    pub ttl: Duration,
    /// Stale-while-revalidate window past the TTL. Default: half the TTL.
    pub stale_window: Duration,
    /// Background prewarm interval. Default: max(30s, 80% of TTL).
    pub prewarm_interval: Duration,
}

impl CachePolicy {
    /// Create a policy with derived defaults for the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            stale_window: ttl / 2,
            prewarm_interval: default_prewarm_interval(ttl),
        }
    }

    /// A policy with caching disabled (TTL zero).
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Set the stale-while-revalidate window.
    pub fn stale_window(mut self, window: Duration) -> Self {
        self.stale_window = window;
        self
    }

    /// Set the prewarm interval.
    pub fn prewarm_interval(mut self, interval: Duration) -> Self {
        self.prewarm_interval = interval;
        self
    }

    /// Whether caching is disabled entirely.
    pub fn is_disabled(&self) -> bool {
        self.ttl.is_zero()
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::new(Duration::from_secs(120))
    }
}

/// `max(30s, 80% of ttl)`, except a zero TTL disables prewarming.
pub(crate) fn default_prewarm_interval(ttl: Duration) -> Duration {
    if ttl.is_zero() {
        Duration::ZERO
    } else {
        PREWARM_FLOOR.max(ttl.mul_f64(0.8))
    }
}

/// Where a record's payload was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Memory,
    Shared,
}

impl CacheBackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheBackendKind::Memory => "memory",
            CacheBackendKind::Shared => "shared",
        }
    }
}

/// How a payload relates to its cache on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
    Stale,
    Frozen,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Stale => "STALE",
            CacheStatus::Frozen => "FROZEN",
        }
    }
}

/// Position of a record inside its freshness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// `age < ttl`.
    Fresh,
    /// `ttl <= age < ttl + stale_window`.
    Stale,
    /// `age >= ttl + stale_window`.
    Expired,
}

/// A cached payload with its capture time and freshness bounds.
///
/// Slots are replaced whole: a new record atomically supersedes the
/// old one, which is only ever read again for fallback construction.
/// Invariant: `cached_at <= expires_at <= stale_until`, guaranteed by
/// construction.
#[derive(Debug, Clone)]
pub struct CacheRecord<T> {
    payload: Arc<T>,
    cached_at: Instant,
    expires_at: Instant,
    stale_until: Instant,
    generated_at: DateTime<Utc>,
}

impl<T> CacheRecord<T> {
    /// Record a freshly fetched payload under the given policy.
    pub fn new(payload: T, policy: &CachePolicy) -> Self {
        let now = Instant::now();
        Self {
            payload: Arc::new(payload),
            cached_at: now,
            expires_at: now + policy.ttl,
            stale_until: now + policy.ttl + policy.stale_window,
            generated_at: Utc::now(),
        }
    }

    /// Reconstruct a record captured `age` ago (shared-store reads).
    pub fn restore(
        payload: T,
        age: Duration,
        policy: &CachePolicy,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let now = Instant::now();
        let cached_at = now.checked_sub(age).unwrap_or(now);
        Self {
            payload: Arc::new(payload),
            cached_at,
            expires_at: cached_at + policy.ttl,
            stale_until: cached_at + policy.ttl + policy.stale_window,
            generated_at,
        }
    }

    pub fn payload(&self) -> &Arc<T> {
        &self.payload
    }

    /// Capture timestamp, wall clock.
    pub fn generated_at(&self) -> DateTime<Utc> {
        self.generated_at
    }

    /// Time since capture.
    pub fn age(&self) -> Duration {
        Instant::now().saturating_duration_since(self.cached_at)
    }

    /// Time until logical expiry, zero once past it.
    pub fn expires_in(&self) -> Duration {
        self.expires_at.saturating_duration_since(Instant::now())
    }

    /// Classify this record against its freshness window.
    pub fn freshness(&self) -> Freshness {
        let now = Instant::now();
        if now < self.expires_at {
            Freshness::Fresh
        } else if now < self.stale_until {
            Freshness::Stale
        } else {
            Freshness::Expired
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_derives_stale_window_and_prewarm() {
        let policy = CachePolicy::new(Duration::from_secs(120));
        assert_eq!(policy.stale_window, Duration::from_secs(60));
        assert_eq!(policy.prewarm_interval, Duration::from_secs(96));
    }

    #[test]
    fn prewarm_interval_has_a_floor() {
        let policy = CachePolicy::new(Duration::from_secs(10));
        assert_eq!(policy.prewarm_interval, Duration::from_secs(30));
    }

    #[test]
    fn zero_ttl_disables_caching() {
        let policy = CachePolicy::disabled();
        assert!(policy.is_disabled());
        assert_eq!(policy.prewarm_interval, Duration::ZERO);
        let record = CacheRecord::new("x", &policy);
        assert_eq!(record.freshness(), Freshness::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn freshness_transitions_across_the_window() {
        let policy =
            CachePolicy::new(Duration::from_secs(120)).stale_window(Duration::from_secs(60));
        let record = CacheRecord::new("payload", &policy);
        assert_eq!(record.freshness(), Freshness::Fresh);

        tokio::time::advance(Duration::from_secs(100)).await;
        assert_eq!(record.freshness(), Freshness::Fresh);
        assert_eq!(record.expires_in(), Duration::from_secs(20));

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(record.freshness(), Freshness::Stale);
        assert_eq!(record.expires_in(), Duration::ZERO);
        assert_eq!(record.age(), Duration::from_secs(150));

        tokio::time::advance(Duration::from_secs(50)).await;
        assert_eq!(record.freshness(), Freshness::Expired);
    }

    #[tokio::test(start_paused = true)]
    async fn restore_backdates_the_capture_time() {
        let policy =
            CachePolicy::new(Duration::from_secs(120)).stale_window(Duration::from_secs(60));
        tokio::time::advance(Duration::from_secs(1000)).await;
        let record = CacheRecord::restore("payload", Duration::from_secs(130), &policy, Utc::now());
        assert_eq!(record.freshness(), Freshness::Stale);
        assert_eq!(record.age(), Duration::from_secs(130));
    }

    #[test]
    fn status_strings_match_header_values() {
        assert_eq!(CacheStatus::Hit.as_str(), "HIT");
        assert_eq!(CacheStatus::Frozen.as_str(), "FROZEN");
        assert_eq!(CacheBackendKind::Shared.as_str(), "shared");
    }
}
