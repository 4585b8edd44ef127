//! HTTP client module
//!
//! Provides the HTTP client adapter with retry, rate limiting, response
//! caching and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: Configurable retry logic with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Response Cache**: Process-lifetime cache keyed by URL and query
//! - **Authentication**: Integration with auth module

mod cache;
mod client;
mod rate_limit;

pub use cache::ResponseCache;
pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};

#[cfg(test)]
mod tests;
