//! Per-client fixed-window admission counters.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Counter state for one key.
struct WindowState {
    /// Admissions in the current window
    count: u32,
    /// Start of the current window
    window_start: Instant,
}

/// Outcome of [`RateLimiter::check`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted { remaining: u32 },
    Rejected { retry_after: Duration },
}

/// Fixed-window rate limiter.
///
/// Each key gets `limit` admissions per `window`. The counter resets
/// completely when the window elapses; there is no sliding component.
pub struct RateLimiter {
    clients: DashMap<String, WindowState>,
    window: Duration,
}

impl RateLimiter {
    pub fn new(window: Duration) -> Self {
        Self {
            clients: DashMap::new(),
            window,
        }
    }

    /// Admit or reject one request for `key` against `limit`.
    ///
    /// The key is typically `"{route class}:{client}"`. Check and increment
    /// run under the key's entry lock.
    pub fn check(&self, key: &str, limit: u32) -> Admission {
        self.check_at(key, limit, Instant::now())
    }

    fn check_at(&self, key: &str, limit: u32, now: Instant) -> Admission {
        let mut entry = self.clients.entry(key.to_string()).or_insert_with(|| WindowState {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.saturating_duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count < limit {
            entry.count += 1;
            Admission::Admitted {
                remaining: limit - entry.count,
            }
        } else {
            let elapsed = now.saturating_duration_since(entry.window_start);
            Admission::Rejected {
                retry_after: self.window.saturating_sub(elapsed),
            }
        }
    }

    /// Remove entries idle for two full windows.
    ///
    /// Called periodically from a background task.
    pub fn gc(&self) {
        self.gc_at(Instant::now());
    }

    fn gc_at(&self, now: Instant) {
        let idle_limit = self.window.saturating_mul(2);
        self.clients
            .retain(|_, state| now.saturating_duration_since(state.window_start) < idle_limit);
    }

    pub fn tracked_keys(&self) -> usize {
        self.clients.len()
    }
}
