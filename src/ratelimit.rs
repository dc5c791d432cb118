//! Process-local sliding-window rate limiting for checkout attempts.
//!
//! Constructed once at startup and injected through `AppState`. The counter
//! map is mutex-guarded; a background task sweeps buckets whose entries have
//! all aged out so the map cannot grow without bound.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;

/// Outcome of a rate-limit check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    Denied { retry_after: Duration },
}

pub struct SlidingWindowLimiter {
    window: Duration,
    limit: usize,
    hits: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl SlidingWindowLimiter {
    pub fn new(window: Duration, limit: usize) -> Self {
        Self {
            window,
            limit,
            hits: Mutex::new(HashMap::new()),
        }
    }

    /// Records an attempt for `key` and decides whether it may proceed.
    /// Denials report how long until the oldest attempt falls out of the
    /// window.
    pub fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        let bucket = hits.entry(key.to_string()).or_default();

        while let Some(&front) = bucket.front() {
            if now.duration_since(front) >= self.window {
                bucket.pop_front();
            } else {
                break;
            }
        }

        if bucket.len() >= self.limit {
            let oldest = bucket.front().copied().unwrap_or(now);
            let retry_after = self.window.saturating_sub(now.duration_since(oldest));
            return Decision::Denied { retry_after };
        }

        bucket.push_back(now);
        Decision::Allowed
    }

    /// Drops buckets whose entries have all aged out of the window.
    pub fn sweep(&self) {
        self.sweep_at(Instant::now());
    }

    fn sweep_at(&self, now: Instant) {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());
        hits.retain(|_, bucket| {
            bucket
                .back()
                .is_some_and(|&last| now.duration_since(last) < self.window)
        });
    }

    #[cfg(test)]
    fn tracked_keys(&self) -> usize {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// Rate-limit key for a request: the first address in `x-forwarded-for`,
/// or a single shared "unknown" bucket when no client address is
/// identifiable.
pub fn client_key(headers: &HeaderMap) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map_or_else(|| "unknown".to_string(), str::to_string)
}
