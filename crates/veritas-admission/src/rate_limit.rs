//! Per-key token-bucket rate limiting.
//!
//! Default 60 requests/minute per key with a continuously refilling
//! bucket rather than fixed windows, so a burst right at a window
//! boundary can't double a caller's effective rate.

use std::collections::HashMap;
use std::sync::Mutex;

/// Default requests-per-minute budget per key.
pub const DEFAULT_RATE_PER_MINUTE: f64 = 60.0;

struct Bucket {
    tokens: f64,
    last_refill: f64,
}

/// Token-bucket limiter keyed by caller identity (typically the API key).
pub struct RateLimiter {
    capacity: f64,
    refill_per_second: f64,
    buckets: Mutex<HashMap<String, Bucket>>,
}

impl RateLimiter {
    pub fn new(rate_per_minute: f64) -> Self {
        RateLimiter {
            capacity: rate_per_minute,
            refill_per_second: rate_per_minute / 60.0,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Attempt to consume one token for `key` at time `now_seconds`
    /// (monotonic, fractional seconds). Returns `true` if the request is
    /// allowed.
    pub fn try_acquire(&self, key: &str, now_seconds: f64) -> bool {
        let mut buckets = self.buckets.lock().unwrap();
        let bucket = buckets.entry(key.to_string()).or_insert_with(|| Bucket {
            tokens: self.capacity,
            last_refill: now_seconds,
        });

        let elapsed = (now_seconds - bucket.last_refill).max(0.0);
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_second).min(self.capacity);
        bucket.last_refill = now_seconds;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_PER_MINUTE)
    }
}
