//! Per-address request limiting.

use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

pub const DEFAULT_MAX_REQUESTS: u32 = 100;
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(15 * 60);

const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after_seconds: u64 },
}

pub trait RateLimiter: Send + Sync {
    fn check_ip(&self, ip: Option<&str>) -> RateLimitDecision;

    /// Drop state that can no longer affect a decision.
    fn purge_expired(&self) {}
}

#[derive(Clone, Debug)]
pub struct NoopRateLimiter;

impl RateLimiter for NoopRateLimiter {
    fn check_ip(&self, _ip: Option<&str>) -> RateLimitDecision {
        RateLimitDecision::Allowed
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Fixed-window counter keyed by client address.
///
/// The first request from an address opens a window; up to `max_requests`
/// are allowed until it elapses, after which the count starts over.
#[derive(Debug)]
pub struct FixedWindowRateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

impl Default for FixedWindowRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REQUESTS, DEFAULT_WINDOW)
    }
}

impl FixedWindowRateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Window>> {
        self.windows.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn check_ip_at(&self, ip: Option<&str>, now: Instant) -> RateLimitDecision {
        let key = ip.map_or(UNKNOWN_CLIENT, str::trim);
        let key = if key.is_empty() { UNKNOWN_CLIENT } else { key };

        let mut windows = self.lock();
        let entry = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            let remaining = self
                .window
                .saturating_sub(now.saturating_duration_since(entry.started));
            // Round up so clients never retry inside the window.
            let retry_after_seconds =
                remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            return RateLimitDecision::Limited {
                retry_after_seconds: retry_after_seconds.max(1),
            };
        }

        entry.count += 1;
        RateLimitDecision::Allowed
    }

    pub(crate) fn purge_expired_at(&self, now: Instant) {
        let window = self.window;
        self.lock()
            .retain(|_, entry| now.saturating_duration_since(entry.started) < window);
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().len()
    }
}

impl RateLimiter for FixedWindowRateLimiter {
    fn check_ip(&self, ip: Option<&str>) -> RateLimitDecision {
        self.check_ip_at(ip, Instant::now())
    }

    fn purge_expired(&self) {
        self.purge_expired_at(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_rate_limiter_allows() {
        let limiter = NoopRateLimiter;
        assert_eq!(limiter.check_ip(None), RateLimitDecision::Allowed);
        assert_eq!(
            limiter.check_ip(Some("203.0.113.9")),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn limits_after_max_requests_in_window() {
        let limiter = FixedWindowRateLimiter::new(3, Duration::from_secs(60));
        let start = Instant::now();

        for _ in 0..3 {
            assert_eq!(
                limiter.check_ip_at(Some("203.0.113.9"), start),
                RateLimitDecision::Allowed
            );
        }
        assert_eq!(
            limiter.check_ip_at(Some("203.0.113.9"), start + Duration::from_secs(10)),
            RateLimitDecision::Limited {
                retry_after_seconds: 50
            }
        );
    }

    #[test]
    fn new_window_resets_count() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert_eq!(
            limiter.check_ip_at(Some("203.0.113.9"), start),
            RateLimitDecision::Allowed
        );
        assert!(matches!(
            limiter.check_ip_at(Some("203.0.113.9"), start + Duration::from_secs(59)),
            RateLimitDecision::Limited { .. }
        ));
        assert_eq!(
            limiter.check_ip_at(Some("203.0.113.9"), start + Duration::from_secs(60)),
            RateLimitDecision::Allowed
        );
    }

    #[test]
    fn addresses_are_counted_separately() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(
            limiter.check_ip_at(Some("203.0.113.9"), now),
            RateLimitDecision::Allowed
        );
        assert_eq!(
            limiter.check_ip_at(Some("198.51.100.7"), now),
            RateLimitDecision::Allowed
        );
        assert!(matches!(
            limiter.check_ip_at(Some("203.0.113.9"), now),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn missing_address_shares_unknown_bucket() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check_ip_at(None, now), RateLimitDecision::Allowed);
        assert!(matches!(
            limiter.check_ip_at(Some("  "), now),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn retry_after_rounds_up() {
        let limiter = FixedWindowRateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_ip_at(Some("203.0.113.9"), start);

        assert_eq!(
            limiter.check_ip_at(Some("203.0.113.9"), start + Duration::from_millis(59_500)),
            RateLimitDecision::Limited {
                retry_after_seconds: 1
            }
        );
    }

    #[test]
    fn purge_drops_finished_windows() {
        let limiter = FixedWindowRateLimiter::new(5, Duration::from_secs(60));
        let start = Instant::now();
        limiter.check_ip_at(Some("203.0.113.9"), start);
        limiter.check_ip_at(Some("198.51.100.7"), start + Duration::from_secs(30));
        assert_eq!(limiter.tracked(), 2);

        limiter.purge_expired_at(start + Duration::from_secs(61));
        assert_eq!(limiter.tracked(), 1);

        limiter.purge_expired_at(start + Duration::from_secs(91));
        assert_eq!(limiter.tracked(), 0);
    }
}
