use async_trait::async_trait;
use chrono::{DateTime, Duration, DurationRound, Utc};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

/// Per-user ceilings on LLM calls.
pub const DAILY_LIMIT: u32 = 50;
pub const HOURLY_LIMIT: u32 = 10;

const KEY_NAMESPACE: &str = "journal:llm";
/// Counters outlive their window slightly so clock skew never resets them early.
const EXPIRY_GRACE_MINUTES: i64 = 5;

/// Expiring integer counters keyed by string.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Current value, or 0 when the key is missing or expired.
    async fn read(&self, key: &str, now: DateTime<Utc>) -> u32;
    async fn write(&self, key: &str, value: u32, expires_at: DateTime<Utc>);
}

/// In-memory counter cache (for single-instance deployments).
/// For multi-instance, back `CounterStore` with a shared cache.
#[derive(Clone, Default)]
pub struct MemoryCounterStore {
    entries: Arc<Mutex<HashMap<String, CounterEntry>>>,
}

struct CounterEntry {
    count: u32,
    expires_at: DateTime<Utc>,
}

impl MemoryCounterStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Drops expired counters. Returns how many were removed.
    pub async fn cleanup(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn read(&self, key: &str, now: DateTime<Utc>) -> u32 {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.count)
            .unwrap_or(0)
    }

    async fn write(&self, key: &str, value: u32, expires_at: DateTime<Utc>) {
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            CounterEntry {
                count: value,
                expires_at,
            },
        );
    }
}

/// Periodically purge expired counters (every 5 min).
pub fn spawn_counter_cleanup_worker(store: MemoryCounterStore) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            let purged = store.cleanup(Utc::now()).await;
            if purged > 0 {
                tracing::debug!(purged = purged, "Rate limit cleanup: purged expired counters");
            }
        }
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Day,
    Hour,
}

impl Window {
    pub fn as_str(self) -> &'static str {
        match self {
            Window::Day => "daily",
            Window::Hour => "hourly",
        }
    }

    fn limit(self) -> u32 {
        match self {
            Window::Day => DAILY_LIMIT,
            Window::Hour => HOURLY_LIMIT,
        }
    }

    fn key(self, user_id: Uuid, now: DateTime<Utc>) -> String {
        match self {
            Window::Day => format!(
                "{}:user:{}:day:{}",
                KEY_NAMESPACE,
                user_id,
                now.format("%Y%m%d")
            ),
            Window::Hour => format!(
                "{}:user:{}:hour:{}",
                KEY_NAMESPACE,
                user_id,
                now.format("%Y%m%d%H")
            ),
        }
    }

    fn expires_at(self, now: DateTime<Utc>) -> DateTime<Utc> {
        let grace = Duration::minutes(EXPIRY_GRACE_MINUTES);
        match self {
            Window::Day => {
                let start = now
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .map(|dt| dt.and_utc())
                    .unwrap_or(now);
                start + Duration::days(1) + grace
            }
            Window::Hour => {
                let start = now.duration_trunc(Duration::hours(1)).unwrap_or(now);
                start + Duration::hours(1) + grace
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitExceeded {
    pub window: Window,
    pub key: String,
}

/// Per-user quota on LLM calls, counted per attempt.
///
/// The read and the increment are separate cache operations, so two
/// concurrent requests from one user can both pass the check and overshoot
/// the ceiling slightly. This is a usage guard, not a billing control.
#[derive(Clone)]
pub struct LlmRateLimiter {
    store: Arc<dyn CounterStore>,
    disabled: bool,
}

impl LlmRateLimiter {
    pub fn new(store: Arc<dyn CounterStore>, disabled: bool) -> Self {
        Self { store, disabled }
    }

    /// Check both windows, then count this call against them.
    pub async fn check(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), RateLimitExceeded> {
        if self.disabled {
            return Ok(());
        }

        let windows = [Window::Day, Window::Hour];

        for window in windows {
            let key = window.key(user_id, now);
            if self.store.read(&key, now).await >= window.limit() {
                return Err(RateLimitExceeded { window, key });
            }
        }

        for window in windows {
            let key = window.key(user_id, now);
            let current = self.store.read(&key, now).await;
            self.store
                .write(&key, current + 1, window.expires_at(now))
                .await;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 5, h, m, 0).unwrap()
    }

    fn limiter(store: &MemoryCounterStore) -> LlmRateLimiter {
        LlmRateLimiter::new(Arc::new(store.clone()), false)
    }

    #[tokio::test]
    async fn test_allows_under_hourly_limit() {
        let store = MemoryCounterStore::new();
        let limiter = limiter(&store);
        let user = Uuid::new_v4();

        for i in 0..HOURLY_LIMIT {
            let result = limiter.check(user, at(10, i)).await;
            assert!(result.is_ok(), "Request {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn test_blocks_eleventh_call_in_hour() {
        let store = MemoryCounterStore::new();
        let limiter = limiter(&store);
        let user = Uuid::new_v4();

        for i in 0..HOURLY_LIMIT {
            limiter.check(user, at(10, i)).await.unwrap();
        }

        let err = limiter.check(user, at(10, 30)).await.unwrap_err();
        assert_eq!(err.window, Window::Hour);
        assert_eq!(err.key, format!("journal:llm:user:{}:hour:2026020510", user));
    }

    #[tokio::test]
    async fn test_next_hour_resets_hourly_but_not_daily() {
        let store = MemoryCounterStore::new();
        let limiter = limiter(&store);
        let user = Uuid::new_v4();

        for i in 0..HOURLY_LIMIT {
            limiter.check(user, at(10, i)).await.unwrap();
        }
        assert!(limiter.check(user, at(11, 0)).await.is_ok());

        let day_key = format!("journal:llm:user:{}:day:20260205", user);
        assert_eq!(store.read(&day_key, at(11, 0)).await, HOURLY_LIMIT + 1);
    }

    #[tokio::test]
    async fn test_daily_limit_checked_first() {
        let store = MemoryCounterStore::new();
        let user = Uuid::new_v4();
        let day_key = format!("journal:llm:user:{}:day:20260205", user);
        store.write(&day_key, DAILY_LIMIT, at(23, 0)).await;

        let err = limiter(&store).check(user, at(9, 0)).await.unwrap_err();
        assert_eq!(err.window, Window::Day);
    }

    #[tokio::test]
    async fn test_rejected_call_does_not_increment() {
        let store = MemoryCounterStore::new();
        let user = Uuid::new_v4();
        let hour_key = format!("journal:llm:user:{}:hour:2026020510", user);
        store.write(&hour_key, HOURLY_LIMIT, at(11, 5)).await;

        let _ = limiter(&store).check(user, at(10, 0)).await;

        let day_key = format!("journal:llm:user:{}:day:20260205", user);
        assert_eq!(store.read(&day_key, at(10, 0)).await, 0);
        assert_eq!(store.read(&hour_key, at(10, 0)).await, HOURLY_LIMIT);
    }

    #[tokio::test]
    async fn test_disabled_limiter_bypasses_counters() {
        let store = MemoryCounterStore::new();
        let user = Uuid::new_v4();
        let hour_key = format!("journal:llm:user:{}:hour:2026020510", user);
        store.write(&hour_key, HOURLY_LIMIT, at(11, 5)).await;

        let limiter = LlmRateLimiter::new(Arc::new(store.clone()), true);
        assert!(limiter.check(user, at(10, 0)).await.is_ok());
        assert_eq!(store.read(&hour_key, at(10, 0)).await, HOURLY_LIMIT);
    }

    #[tokio::test]
    async fn test_different_users_have_separate_limits() {
        let store = MemoryCounterStore::new();
        let limiter = limiter(&store);
        let first = Uuid::new_v4();

        for i in 0..HOURLY_LIMIT {
            limiter.check(first, at(10, i)).await.unwrap();
        }

        assert!(limiter.check(Uuid::new_v4(), at(10, 20)).await.is_ok());
    }

    #[test]
    fn test_counter_expiry_is_past_window_end() {
        assert_eq!(
            Window::Hour.expires_at(at(10, 42)),
            Utc.with_ymd_and_hms(2026, 2, 5, 11, 5, 0).unwrap()
        );
        assert_eq!(
            Window::Day.expires_at(at(10, 42)),
            Utc.with_ymd_and_hms(2026, 2, 6, 0, 5, 0).unwrap()
        );
    }

    #[tokio::test]
    async fn test_cleanup_purges_expired_counters() {
        let store = MemoryCounterStore::new();
        store.write("a", 3, at(10, 0)).await;
        store.write("b", 1, at(12, 0)).await;

        assert_eq!(store.cleanup(at(11, 0)).await, 1);
        assert_eq!(store.read("a", at(9, 0)).await, 0);
        assert_eq!(store.read("b", at(11, 0)).await, 1);
    }
}
