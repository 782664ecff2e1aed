//! Rate limiting implementation
//!
//! Two independent mechanisms:
//! - `RateLimiter`: client-side token bucket (governor) pacing every request
//! - `RateLimitGate`: server-imposed pause, fed from response headers and
//!   awaited by the poll loop before every fetch

use chrono::Utc;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::header::HeaderMap;
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::warn;

/// Fallback pause when the server signals a limit without saying how long
pub const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Upper bound on any server-requested pause
pub const MAX_PAUSE_SECS: u64 = 24 * 60 * 60;

/// Configuration for rate limiting
#[derive(Debug, Clone)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            burst_size: 5,
        }
    }
}

impl RateLimiterConfig {
    /// Create a new rate limiter config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Create a new rate limiter with the given config
    pub fn new(config: &RateLimiterConfig) -> Self {
        let quota = Quota::per_second(
            NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN),
        )
        .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN));

        Self {
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(&RateLimiterConfig::default())
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter").finish()
    }
}

/// Server-imposed "do not call before" instant
///
/// Clones share the same deadline, so the HTTP client can record a pause
/// that the poll loop later honors.
#[derive(Clone, Default)]
pub struct RateLimitGate {
    pause_until: Arc<Mutex<Option<Instant>>>,
}

impl RateLimitGate {
    /// Create an open gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the gate for at least `duration`; never shortens an existing pause
    pub fn pause_for(&self, duration: Duration) {
        let duration = duration.min(Duration::from_secs(MAX_PAUSE_SECS));
        let now = Instant::now();
        let until = now.checked_add(duration).unwrap_or(now);
        let mut guard = self.lock();
        match *guard {
            Some(existing) if existing >= until => {}
            _ => *guard = Some(until),
        }
    }

    /// Time left before the gate reopens, or `None` if it is open
    pub fn remaining(&self) -> Option<Duration> {
        let guard = self.lock();
        let until = (*guard)?;
        let now = Instant::now();
        (until > now).then(|| until - now)
    }

    /// Check whether a call may be made now
    pub fn is_open(&self) -> bool {
        self.remaining().is_none()
    }

    /// Sleep until the gate reopens
    pub async fn wait(&self) {
        while let Some(remaining) = self.remaining() {
            tokio::time::sleep(remaining).await;
        }
    }

    /// Inspect response headers and close the gate if the quota is spent
    ///
    /// Returns the pause in seconds when one was applied.
    pub fn observe(&self, headers: &HeaderMap) -> Option<u64> {
        let seconds = pause_from_headers(headers)?;
        warn!(seconds, "Remote rate limit reached, pausing");
        self.pause_for(Duration::from_secs(seconds));
        Some(seconds)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Instant>> {
        // a poisoned lock still holds a valid Option
        self.pause_until
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RateLimitGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitGate")
            .field("remaining", &self.remaining())
            .finish()
    }
}

/// Derive a mandatory pause from rate-limit headers
///
/// `Retry-After` wins; otherwise an exhausted `X-RateLimit-Remaining` pauses
/// until `X-RateLimit-Reset` (epoch seconds). Capped at [`MAX_PAUSE_SECS`].
pub fn pause_from_headers(headers: &HeaderMap) -> Option<u64> {
    if let Some(retry_after) = header_u64(headers, "retry-after") {
        return Some(retry_after.min(MAX_PAUSE_SECS));
    }

    if header_u64(headers, "x-ratelimit-remaining") != Some(0) {
        return None;
    }

    let pause = match header_u64(headers, "x-ratelimit-reset") {
        Some(reset) => {
            let now = Utc::now().timestamp().max(0) as u64;
            // reset is truncated to whole seconds
            reset.saturating_sub(now).saturating_add(1)
        }
        None => DEFAULT_RETRY_AFTER_SECS,
    };
    Some(pause.min(MAX_PAUSE_SECS))
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
