//! HTTP client module
//!
//! Provides HTTP client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Server Pauses**: `RateLimitGate` records the pause demanded by
//!   `Retry-After` / `X-RateLimit-*` headers for the poll loop to honor
//! - **Authentication**: Integration with auth module

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{
    pause_from_headers, RateLimitGate, RateLimiter, RateLimiterConfig, DEFAULT_RETRY_AFTER_SECS,
    MAX_PAUSE_SECS,
};
