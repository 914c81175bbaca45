use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

// Outcome of one request against the limiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    // Time until the client's window resets.
    pub reset_after: Duration,
}

impl RateLimitDecision {
    // Whole seconds, rounded up so clients never retry early
    pub fn reset_secs(&self) -> u64 {
        let secs = self.reset_after.as_secs();
        if self.reset_after.subsec_nanos() > 0 {
            secs + 1
        } else {
            secs
        }
    }
}

pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    clients: Mutex<HashMap<String, Window>>,
    last_prune: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window,
            max_requests,
            clients: Mutex::new(HashMap::new()),
            last_prune: Mutex::new(Instant::now()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn check(&self, key: &str) -> RateLimitDecision {
        self.check_at(key, Instant::now())
    }

    pub fn check_at(&self, key: &str, now: Instant) -> RateLimitDecision {
        self.prune_expired(now);

        let mut clients = self.clients.lock();
        let entry = clients
            .entry(key.to_string())
            .or_insert(Window { started: now, count: 0 });

        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window { started: now, count: 0 };
        }
        entry.count = entry.count.saturating_add(1);

        let elapsed = now.saturating_duration_since(entry.started);
        RateLimitDecision {
            allowed: entry.count <= self.max_requests,
            limit: self.max_requests,
            remaining: self.max_requests.saturating_sub(entry.count),
            reset_after: self.window.saturating_sub(elapsed),
        }
    }

    pub fn tracked_clients(&self) -> usize {
        self.clients.lock().len()
    }

    // Drops finished windows at most once per window length
    fn prune_expired(&self, now: Instant) {
        {
            let mut last_prune = self.last_prune.lock();
            if now.saturating_duration_since(*last_prune) < self.window {
                return;
            }
            *last_prune = now;
        }

        let window = self.window;
        self.clients
            .lock()
            .retain(|_, w| now.saturating_duration_since(w.started) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_max_then_rejects() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 3);
        let now = Instant::now();

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check_at("10.0.0.1", now);
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
            assert_eq!(decision.limit, 3);
        }

        let rejected = limiter.check_at("10.0.0.1", now);
        assert!(!rejected.allowed);
        assert_eq!(rejected.remaining, 0);
    }

    #[test]
    fn clients_are_limited_independently() {
        let limiter = RateLimiter::new(Duration::from_secs(60), 1);
        let now = Instant::now();

        assert!(limiter.check_at("a", now).allowed);
        assert!(!limiter.check_at("a", now).allowed);
        assert!(limiter.check_at("b", now).allowed);
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new(Duration::from_secs(10), 1);
        let start = Instant::now();

        assert!(limiter.check_at("a", start).allowed);
        let blocked = limiter.check_at("a", start + Duration::from_secs(4));
        assert!(!blocked.allowed);
        assert_eq!(blocked.reset_after, Duration::from_secs(6));
        assert_eq!(blocked.reset_secs(), 6);

        assert!(limiter.check_at("a", start + Duration::from_secs(10)).allowed);
    }

    #[test]
    fn reset_rounds_up_partial_seconds() {
        let decision = RateLimitDecision {
            allowed: true,
            limit: 1,
            remaining: 0,
            reset_after: Duration::from_millis(1500),
        };
        assert_eq!(decision.reset_secs(), 2);
    }

    #[test]
    fn expired_windows_are_pruned() {
        let limiter = RateLimiter::new(Duration::from_secs(5), 10);
        let start = Instant::now();

        limiter.check_at("a", start);
        limiter.check_at("b", start);
        assert_eq!(limiter.tracked_clients(), 2);

        limiter.check_at("c", start + Duration::from_secs(6));
        assert_eq!(limiter.tracked_clients(), 1);
    }
}
