//! Login throttling against password guessing
//!
//! Failures are counted per username inside a sliding window; reaching the
//! limit locks the username for the ban duration. A successful login clears
//! the count. Usernames whose window and ban have both run out are dropped the
//! next time an unknown username fails.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::warn;

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Failures allowed before the key is locked
    pub max_attempts: u32,
    /// Window the failures are counted in
    pub window: Duration,
    /// How long a locked key stays locked
    pub ban_duration: Duration,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::from_secs(300),
            ban_duration: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
struct RateLimiterEntry {
    failures: u32,
    window_start: Instant,
    ban_expires: Option<Instant>,
}

impl RateLimiterEntry {
    /// Neither counting failures nor locking anything any more
    fn is_stale(&self, now: Instant, window: Duration) -> bool {
        now.duration_since(self.window_start) >= window
            && self.ban_expires.is_none_or(|expires| now >= expires)
    }
}

/// Rate limiter
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    entries: Arc<Mutex<HashMap<String, RateLimiterEntry>>>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: RateLimiterConfig) -> Self {
        Self {
            config,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Whether `key` is currently locked out
    pub async fn is_locked(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        match entries.get(key).and_then(|entry| entry.ban_expires) {
            Some(expires) if now < expires => true,
            Some(_) => {
                entries.remove(key);
                false
            }
            None => false,
        }
    }

    /// Count one failed attempt; returns true when this failure locks the key
    pub async fn record_failure(&self, key: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();

        if !entries.contains_key(key) {
            let window = self.config.window;
            entries.retain(|_, entry| !entry.is_stale(now, window));
        }

        let entry = entries.entry(key.to_string()).or_insert(RateLimiterEntry {
            failures: 0,
            window_start: now,
            ban_expires: None,
        });

        if now.duration_since(entry.window_start) >= self.config.window {
            entry.failures = 0;
            entry.window_start = now;
        }

        entry.failures += 1;
        if entry.failures >= self.config.max_attempts && entry.ban_expires.is_none() {
            entry.ban_expires = Some(now + self.config.ban_duration);
            warn!(
                "Locked {} for {} seconds after {} failed logins",
                key,
                self.config.ban_duration.as_secs(),
                entry.failures
            );
            return true;
        }

        false
    }

    /// Forget every failure recorded for `key`
    pub async fn reset(&self, key: &str) {
        self.entries.lock().await.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(window: Duration, ban: Duration) -> RateLimiter {
        RateLimiter::new(RateLimiterConfig {
            max_attempts: 3,
            window,
            ban_duration: ban,
        })
    }

    #[tokio::test]
    async fn locks_after_max_failures() {
        let limiter = limiter(Duration::from_secs(60), Duration::from_secs(60));

        assert!(!limiter.record_failure("ana").await);
        assert!(!limiter.record_failure("ana").await);
        assert!(!limiter.is_locked("ana").await);
        assert!(limiter.record_failure("ana").await);
        assert!(limiter.is_locked("ana").await);

        assert!(!limiter.is_locked("ben").await);
    }

    #[tokio::test]
    async fn reset_clears_failures() {
        let limiter = limiter(Duration::from_secs(60), Duration::from_secs(60));

        limiter.record_failure("ana").await;
        limiter.record_failure("ana").await;
        limiter.reset("ana").await;
        assert!(!limiter.record_failure("ana").await);
        assert!(!limiter.is_locked("ana").await);
    }

    #[tokio::test]
    async fn lock_expires() {
        let limiter = limiter(Duration::from_secs(60), Duration::from_millis(30));

        for _ in 0..3 {
            limiter.record_failure("ana").await;
        }
        assert!(limiter.is_locked("ana").await);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!limiter.is_locked("ana").await);
        assert!(!limiter.record_failure("ana").await);
    }

    #[tokio::test]
    async fn expired_usernames_are_forgotten() {
        let limiter = limiter(Duration::from_millis(1), Duration::from_millis(1));

        for n in 0..1_000 {
            limiter.record_failure(&format!("user-{n}")).await;
        }
        for _ in 0..3 {
            limiter.record_failure("locked").await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        limiter.record_failure("fresh").await;
        let entries = limiter.entries.lock().await;
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("fresh"));
    }

    #[tokio::test]
    async fn pruning_keeps_active_bans() {
        let limiter = limiter(Duration::from_millis(1), Duration::from_secs(60));

        for _ in 0..3 {
            limiter.record_failure("ana").await;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;

        limiter.record_failure("ben").await;
        assert!(limiter.is_locked("ana").await);
    }

    #[tokio::test]
    async fn failures_outside_the_window_do_not_add_up() {
        let limiter = limiter(Duration::from_millis(30), Duration::from_secs(60));

        limiter.record_failure("ana").await;
        limiter.record_failure("ana").await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!limiter.record_failure("ana").await);
        assert!(!limiter.is_locked("ana").await);
    }
}
