//! Quota configuration for rate limiting.
//!
//! A [`Quota`] defines the rate limiting parameters for a single
//! [`RateKey`](crate::key::RateKey): how many requests are allowed over
//! what sliding time window.
//!
//! # Examples
//!
//! ```
//! use tenant_ratelimit::Quota;
//! use std::time::Duration;
//!
//! // 100 requests per minute
//! let quota = Quota::per_minute(100);
//!
//! // Custom: 50 requests per 30 seconds
//! let quota = Quota::new(50, Duration::from_secs(30)).unwrap();
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Rate limiting quota configuration.
///
/// A quota defines the maximum number of requests admitted within a
/// sliding time window. Both fields are required to be strictly positive;
/// [`Quota::new`] validates this and [`Quota::try_new`] returns the same
/// check as a `Result` for callers that want to handle it explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    /// Maximum number of requests admitted in the window.
    max_requests: u64,

    /// Duration of the sliding window.
    window: Duration,
}

impl Quota {
    /// Create a new quota with the given maximum requests and window.
    ///
    /// Returns [`ConfigError::InvalidQuota`] if `max_requests` is zero or
    /// `window` is zero duration.
    pub fn new(max_requests: u64, window: Duration) -> std::result::Result<Self, ConfigError> {
        if max_requests == 0 {
            return Err(ConfigError::InvalidQuota(
                "max_requests must be greater than 0".into(),
            ));
        }
        if window.is_zero() {
            return Err(ConfigError::InvalidQuota("window must be non-zero".into()));
        }
        Ok(Self {
            max_requests,
            window,
        })
    }

    /// Alias of [`Quota::new`], kept for call sites that prefer a
    /// `try_`-prefixed fallible constructor.
    pub fn try_new(max_requests: u64, window: Duration) -> std::result::Result<Self, ConfigError> {
        Self::new(max_requests, window)
    }

    /// Create a quota allowing `n` requests per second.
    pub fn per_second(n: u64) -> Self {
        Self::new(n, Duration::from_secs(1)).expect("per_second quota is always valid for n > 0")
    }

    /// Create a quota allowing `n` requests per minute.
    pub fn per_minute(n: u64) -> Self {
        Self::new(n, Duration::from_secs(60)).expect("per_minute quota is always valid for n > 0")
    }

    /// Create a quota allowing `n` requests per hour.
    pub fn per_hour(n: u64) -> Self {
        Self::new(n, Duration::from_secs(3600)).expect("per_hour quota is always valid for n > 0")
    }

    /// Get the maximum requests allowed per window.
    pub fn max_requests(&self) -> u64 {
        self.max_requests
    }

    /// Get the window duration.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Get the window duration as fractional seconds.
    pub fn window_secs(&self) -> f64 {
        self.window.as_secs_f64()
    }
}

impl Default for Quota {
    fn default() -> Self {
        Self::per_minute(60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quota_per_second() {
        let quota = Quota::per_second(10);
        assert_eq!(quota.max_requests(), 10);
        assert_eq!(quota.window(), Duration::from_secs(1));
    }

    #[test]
    fn test_quota_per_minute() {
        let quota = Quota::per_minute(60);
        assert_eq!(quota.max_requests(), 60);
        assert_eq!(quota.window(), Duration::from_secs(60));
    }

    #[test]
    fn test_quota_new_rejects_zero_requests() {
        let err = Quota::new(0, Duration::from_secs(60)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQuota(_)));
    }

    #[test]
    fn test_quota_new_rejects_zero_window() {
        let err = Quota::new(100, Duration::ZERO).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidQuota(_)));
    }

    #[test]
    fn test_quota_default() {
        let quota = Quota::default();
        assert_eq!(quota.max_requests(), 60);
        assert_eq!(quota.window(), Duration::from_secs(60));
    }
}
