//! Per-requester rate limiting
//!
//! A `RateLimiter` is created once per process and shared by reference.
//! Each key gets a sliding window of request timestamps. Time comes from an
//! injected `Clock` so tests can drive it by hand.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

/// Source of the current time
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    start: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    /// Create a clock frozen at the current instant
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().unwrap_or_else(|p| p.into_inner());
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + *self.offset.lock().unwrap_or_else(|p| p.into_inner())
    }
}

/// Sliding-window request limiter keyed by requester
pub struct RateLimiter {
    limit: usize,
    window: Duration,
    clock: Arc<dyn Clock>,
    buckets: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("limit", &self.limit)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl RateLimiter {
    /// Create a limiter using the wall clock
    pub fn new(limit: usize, window: Duration) -> Self {
        Self::with_clock(limit, window, Arc::new(SystemClock))
    }

    /// Create a limiter with an explicit clock
    pub fn with_clock(limit: usize, window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            limit,
            window,
            clock,
            buckets: Mutex::new(HashMap::new()),
        }
    }

    /// Record a request for `key` if it is within the limit
    ///
    /// On refusal returns how long until the oldest request leaves the window.
    pub fn check_and_record(&self, key: &str) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut buckets = self.buckets.lock().unwrap_or_else(|p| p.into_inner());
        let bucket = buckets.entry(key.to_string()).or_default();

        // Remove timestamps outside window
        while let Some(&timestamp) = bucket.front() {
            if now.duration_since(timestamp) >= self.window {
                bucket.pop_front();
            } else {
                break;
            }
        }

        if bucket.len() < self.limit {
            bucket.push_back(now);
            debug!(key = %key, used = bucket.len(), limit = self.limit, "Rate limit check passed");
            return Ok(());
        }

        let retry_after = bucket
            .front()
            .map(|oldest| self.window.saturating_sub(now.duration_since(*oldest)))
            .unwrap_or(self.window);
        warn!(key = %key, retry_after_ms = retry_after.as_millis() as u64, "Rate limit exceeded");
        Err(retry_after)
    }

    /// Forget all history for a key
    pub fn clear(&self, key: &str) {
        self.buckets
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .remove(key);
    }
}
