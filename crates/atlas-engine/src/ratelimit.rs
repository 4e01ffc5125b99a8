//! # Login Rate Limiter
//!
//! A per-identifier sliding-window failure counter with lockout.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Per-identifier record lifecycle                            │
//! │                                                                         │
//! │  (no record) ──failure──► count=1 ──failure──► ... ──► count=5          │
//! │       ▲                      │                            │             │
//! │       │                      │ success, or                │ next        │
//! │       │                      │ window expiry              │ check()     │
//! │       └──────────────────────┴───────────────┐            ▼             │
//! │                                              │   lockout_until =        │
//! │                                              │   now + 15min            │
//! │                                              │            │             │
//! │                                              │            │ lockout     │
//! │                                              │            │ expires     │
//! │                                              └────────────┘             │
//! │                                                                         │
//! │  NOTE: the lockout is stored LAZILY — the fifth failed record() does    │
//! │  not set it; the next check() computes and stores it. This preserves    │
//! │  the observable ordering of the reference behavior.                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Bookkeeping
//! The attempt table is process-scoped and capacity-bounded: exceeding the
//! ceiling evicts the oldest entries in bulk, and a periodic [`sweep`]
//! removes records whose lockout has expired. Deployments with multiple
//! service instances should back this with a shared store instead; this
//! component keeps that swap possible by owning all access behind its API.
//!
//! [`sweep`]: LoginRateLimiter::sweep

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};

// =============================================================================
// Clock
// =============================================================================

/// Time source, injected so tests control the window and lockout math.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// Rate limiter tuning.
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Consecutive failures before lockout. Default: 5
    pub max_attempts: u32,

    /// Failures older than this are forgiven on the next check.
    /// Default: 15 minutes
    pub attempt_window: Duration,

    /// How long a lockout lasts. Default: 15 minutes
    pub lockout_duration: Duration,

    /// Ceiling on tracked identifiers; exceeding it evicts the oldest
    /// entries in bulk. Default: 1000
    pub capacity: usize,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        RateLimiterConfig {
            max_attempts: 5,
            attempt_window: Duration::minutes(15),
            lockout_duration: Duration::minutes(15),
            capacity: 1000,
        }
    }
}

// =============================================================================
// Records & Gate
// =============================================================================

/// Per-identifier failure record. Transient, process-scoped.
#[derive(Debug, Clone, Default)]
struct AttemptRecord {
    /// Consecutive failures.
    count: u32,
    /// Active lockout expiry, stored lazily by `check`.
    lockout_until: Option<DateTime<Utc>>,
    last_attempt_at: Option<DateTime<Utc>>,
}

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginGate {
    pub allowed: bool,
    /// Attempts left before lockout; present when allowed.
    pub remaining_attempts: Option<u32>,
    /// Lockout expiry; present when denied.
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginGate {
    fn allowed(remaining: u32) -> Self {
        LoginGate {
            allowed: true,
            remaining_attempts: Some(remaining),
            locked_until: None,
        }
    }

    fn denied(until: DateTime<Utc>) -> Self {
        LoginGate {
            allowed: false,
            remaining_attempts: None,
            locked_until: Some(until),
        }
    }

    /// Maps a denial to [`EngineError::RateLimited`] for the boundary.
    pub fn require(&self) -> EngineResult<()> {
        match self.locked_until {
            Some(locked_until) if !self.allowed => Err(EngineError::RateLimited { locked_until }),
            _ => Ok(()),
        }
    }
}

/// Internal verdict, resolved after the map guard is released.
enum Verdict {
    Allow(u32),
    Deny(DateTime<Utc>),
    /// Window or lockout expired; drop the record and allow.
    Forgive,
}

// =============================================================================
// LoginRateLimiter
// =============================================================================

/// Tracks failed authentication attempts per identifier and enforces
/// temporary lockout.
pub struct LoginRateLimiter {
    config: RateLimiterConfig,
    clock: Arc<dyn Clock>,
    records: DashMap<String, AttemptRecord>,
}

impl LoginRateLimiter {
    /// Creates a limiter with the default config and wall clock.
    pub fn new() -> Self {
        Self::with_config(RateLimiterConfig::default(), Arc::new(SystemClock))
    }

    /// Creates a limiter with explicit config and clock.
    pub fn with_config(config: RateLimiterConfig, clock: Arc<dyn Clock>) -> Self {
        LoginRateLimiter {
            config,
            clock,
            records: DashMap::new(),
        }
    }

    /// Checks whether `identifier` may attempt a login.
    ///
    /// ## Decision Order
    /// 1. Active lockout → denied with its expiry
    /// 2. Expired lockout, or last attempt older than the window → record
    ///    dropped, allowed with a full budget
    /// 3. Count at the ceiling → lockout computed and stored NOW (lazily),
    ///    denied
    /// 4. Otherwise allowed, reporting the remaining budget
    pub fn check(&self, identifier: &str) -> LoginGate {
        let now = self.clock.now();

        let verdict = {
            // Entry guard scope: the shard stays locked while we decide, so
            // concurrent checks for one identifier serialize
            match self.records.get_mut(identifier) {
                None => Verdict::Allow(self.config.max_attempts),
                Some(mut entry) => {
                    let record = entry.value_mut();
                    if let Some(until) = record.lockout_until {
                        if until > now {
                            Verdict::Deny(until)
                        } else {
                            Verdict::Forgive
                        }
                    } else if record
                        .last_attempt_at
                        .is_some_and(|last| now - last > self.config.attempt_window)
                    {
                        Verdict::Forgive
                    } else if record.count >= self.config.max_attempts {
                        let until = now + self.config.lockout_duration;
                        record.lockout_until = Some(until);
                        Verdict::Deny(until)
                    } else {
                        Verdict::Allow(self.config.max_attempts - record.count)
                    }
                }
            }
        };

        match verdict {
            Verdict::Allow(remaining) => LoginGate::allowed(remaining),
            Verdict::Deny(until) => {
                info!(identifier = %identifier, until = %until, "Login attempt denied");
                LoginGate::denied(until)
            }
            Verdict::Forgive => {
                self.records.remove(identifier);
                LoginGate::allowed(self.config.max_attempts)
            }
        }
    }

    /// Records the outcome of a login attempt.
    ///
    /// Success clears the record entirely. Failure increments the counter
    /// and stamps the attempt time; the lockout itself is stored by the
    /// next [`check`](Self::check), not here.
    pub fn record(&self, identifier: &str, success: bool) {
        if success {
            self.records.remove(identifier);
            debug!(identifier = %identifier, "Login succeeded; attempt record cleared");
            return;
        }

        let now = self.clock.now();
        {
            let mut entry = self.records.entry(identifier.to_string()).or_default();
            entry.count += 1;
            entry.last_attempt_at = Some(now);
            debug!(identifier = %identifier, count = entry.count, "Login failure recorded");
        }

        if self.records.len() > self.config.capacity {
            self.evict_oldest();
        }
    }

    /// Removes records whose lockout has already expired.
    ///
    /// Callers schedule this periodically; it is also safe to never call
    /// it, since `check` forgives expired lockouts on contact.
    pub fn sweep(&self) {
        let now = self.clock.now();
        let before = self.records.len();

        self.records
            .retain(|_, record| record.lockout_until.is_none_or(|until| until > now));

        let removed = before - self.records.len();
        if removed > 0 {
            debug!(removed = removed, "Swept expired lockouts");
        }
    }

    /// Number of tracked identifiers.
    pub fn tracked(&self) -> usize {
        self.records.len()
    }

    /// Bulk-evicts the oldest entries down to 3/4 of capacity.
    fn evict_oldest(&self) {
        let target = self.config.capacity * 3 / 4;
        let mut entries: Vec<(String, DateTime<Utc>)> = self
            .records
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    entry
                        .value()
                        .last_attempt_at
                        .unwrap_or(DateTime::<Utc>::MIN_UTC),
                )
            })
            .collect();

        if entries.len() <= target {
            return;
        }

        entries.sort_by(|a, b| a.1.cmp(&b.1));
        let excess = entries.len() - target;
        for (key, _) in entries.into_iter().take(excess) {
            self.records.remove(&key);
        }

        info!(evicted = excess, "Login attempt table evicted oldest entries");
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Test clock advanced by hand.
    struct ManualClock(Mutex<DateTime<Utc>>);

    impl ManualClock {
        fn starting_at(at: DateTime<Utc>) -> Arc<Self> {
            Arc::new(ManualClock(Mutex::new(at)))
        }

        fn advance(&self, by: Duration) {
            *self.0.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    fn limiter_at(
        config: RateLimiterConfig,
    ) -> (LoginRateLimiter, Arc<ManualClock>) {
        let clock = ManualClock::starting_at(Utc::now());
        let limiter = LoginRateLimiter::with_config(config, clock.clone());
        (limiter, clock)
    }

    #[test]
    fn test_fresh_identifier_is_allowed() {
        let (limiter, _clock) = limiter_at(RateLimiterConfig::default());

        let gate = limiter.check("amira@example.com");
        assert!(gate.allowed);
        assert_eq!(gate.remaining_attempts, Some(5));
        assert!(gate.require().is_ok());
    }

    #[test]
    fn test_five_failures_lock_out_for_fifteen_minutes() {
        let (limiter, clock) = limiter_at(RateLimiterConfig::default());
        let id = "amira@example.com";

        for _ in 0..5 {
            limiter.record(id, false);
        }

        let gate = limiter.check(id);
        assert!(!gate.allowed);
        assert_eq!(gate.locked_until, Some(clock.now() + Duration::minutes(15)));
        assert!(matches!(
            gate.require().unwrap_err(),
            EngineError::RateLimited { .. }
        ));
    }

    #[test]
    fn test_lockout_is_stored_by_check_not_record() {
        let (limiter, _clock) = limiter_at(RateLimiterConfig::default());
        let id = "amira@example.com";

        for _ in 0..5 {
            limiter.record(id, false);
        }

        // The fifth record() has NOT stored a lockout yet
        assert!(limiter
            .records
            .get(id)
            .unwrap()
            .lockout_until
            .is_none());

        // The next check() computes and stores it
        let gate = limiter.check(id);
        assert!(!gate.allowed);
        assert!(limiter
            .records
            .get(id)
            .unwrap()
            .lockout_until
            .is_some());

        // And later checks report the SAME expiry, not a sliding one
        let again = limiter.check(id);
        assert_eq!(again.locked_until, gate.locked_until);
    }

    #[test]
    fn test_remaining_attempts_count_down() {
        let (limiter, _clock) = limiter_at(RateLimiterConfig::default());
        let id = "amira@example.com";

        limiter.record(id, false);
        limiter.record(id, false);

        let gate = limiter.check(id);
        assert!(gate.allowed);
        assert_eq!(gate.remaining_attempts, Some(3));
    }

    #[test]
    fn test_success_resets_the_counter_fully() {
        let (limiter, _clock) = limiter_at(RateLimiterConfig::default());
        let id = "amira@example.com";

        for _ in 0..4 {
            limiter.record(id, false);
        }
        limiter.record(id, true);

        let gate = limiter.check(id);
        assert_eq!(gate.remaining_attempts, Some(5));

        // A full five failures are required again before lockout
        for _ in 0..4 {
            limiter.record(id, false);
        }
        assert!(limiter.check(id).allowed);
        limiter.record(id, false);
        assert!(!limiter.check(id).allowed);
    }

    #[test]
    fn test_window_expiry_forgives_failures() {
        let (limiter, clock) = limiter_at(RateLimiterConfig::default());
        let id = "amira@example.com";

        for _ in 0..3 {
            limiter.record(id, false);
        }
        clock.advance(Duration::minutes(16));

        let gate = limiter.check(id);
        assert!(gate.allowed);
        assert_eq!(gate.remaining_attempts, Some(5));
        // The record is gone entirely
        assert_eq!(limiter.tracked(), 0);
    }

    #[test]
    fn test_lockout_expires() {
        let (limiter, clock) = limiter_at(RateLimiterConfig::default());
        let id = "amira@example.com";

        for _ in 0..5 {
            limiter.record(id, false);
        }
        assert!(!limiter.check(id).allowed);

        clock.advance(Duration::minutes(16));
        let gate = limiter.check(id);
        assert!(gate.allowed);
        assert_eq!(gate.remaining_attempts, Some(5));
    }

    #[test]
    fn test_capacity_eviction_drops_oldest_in_bulk() {
        let config = RateLimiterConfig {
            capacity: 8,
            ..RateLimiterConfig::default()
        };
        let (limiter, clock) = limiter_at(config);

        for i in 0..20 {
            limiter.record(&format!("user{i}@example.com"), false);
            clock.advance(Duration::seconds(1));
        }

        assert!(limiter.tracked() <= 8);
        // The newest identifiers survive
        assert!(limiter.records.contains_key("user19@example.com"));
        assert!(!limiter.records.contains_key("user0@example.com"));
    }

    #[test]
    fn test_sweep_removes_only_expired_lockouts() {
        let (limiter, clock) = limiter_at(RateLimiterConfig::default());

        // Locked out identifier
        for _ in 0..5 {
            limiter.record("locked@example.com", false);
        }
        limiter.check("locked@example.com");

        // Identifier with plain failures, no lockout
        limiter.record("counting@example.com", false);

        clock.advance(Duration::minutes(16));
        limiter.sweep();

        assert!(!limiter.records.contains_key("locked@example.com"));
        assert!(limiter.records.contains_key("counting@example.com"));
    }

    #[test]
    fn test_concurrent_failures_lose_no_increments() {
        let (limiter, _clock) = limiter_at(RateLimiterConfig {
            max_attempts: 1000,
            ..RateLimiterConfig::default()
        });
        let limiter = Arc::new(limiter);
        let id = "amira@example.com";

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let limiter = limiter.clone();
                scope.spawn(move || {
                    for _ in 0..50 {
                        limiter.record(id, false);
                    }
                });
            }
        });

        assert_eq!(limiter.records.get(id).unwrap().count, 400);
    }
}
