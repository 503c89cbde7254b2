//! In-memory request rate limiting.
//!
//! Advisory, per-process fixed-window limiter. State lives in a plain
//! map and resets on restart; this bounds abuse on a single instance,
//! nothing more.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct WindowState {
    count: u32,
    window_start: Instant,
}

/// Fixed-window limiter keyed by client identifier.
pub struct MemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    state: Mutex<HashMap<String, WindowState>>,
}

impl MemoryRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request from `identifier`. Returns false when the
    /// caller has exhausted the current window.
    pub fn check(&self, identifier: &str) -> bool {
        self.check_at(identifier, Instant::now())
    }

    fn check_at(&self, identifier: &str, now: Instant) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());

        // Opportunistic cleanup keeps the map from growing unbounded.
        if state.len() > 1024 {
            let window = self.window;
            state.retain(|_, w| now.duration_since(w.window_start) < window);
        }

        let entry = state.entry(identifier.to_string()).or_insert(WindowState {
            count: 0,
            window_start: now,
        });

        if now.duration_since(entry.window_start) >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            return false;
        }
        entry.count += 1;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_the_limit_then_blocks() {
        let limiter = MemoryRateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(limiter.check("1.2.3.4"));
        assert!(!limiter.check("1.2.3.4"));
    }

    #[test]
    fn identifiers_are_independent() {
        let limiter = MemoryRateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("a"));
        assert!(!limiter.check("a"));
        assert!(limiter.check("b"));
    }

    #[test]
    fn window_expiry_resets_the_count() {
        let limiter = MemoryRateLimiter::new(1, Duration::from_millis(10));
        let start = Instant::now();
        assert!(limiter.check_at("a", start));
        assert!(!limiter.check_at("a", start));
        assert!(limiter.check_at("a", start + Duration::from_millis(11)));
    }
}
