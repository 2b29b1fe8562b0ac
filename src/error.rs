//! Error types for the rate limiting engine.
//!
//! This module provides the error hierarchy surfaced by every component:
//! the Config Store rejects bad writes with [`ConfigError`], and everything
//! else funnels through [`RateLimitError`].

use thiserror::Error;

/// Result type for rate limiting operations.
pub type Result<T> = std::result::Result<T, RateLimitError>;

/// Main error type for rate limiting operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RateLimitError {
    /// Missing/empty identifier, non-positive quota, or other malformed input.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The resolver found neither a client override, an action limit, nor a
    /// caller-supplied fallback quota.
    #[error("no quota configured for this key")]
    NoQuota,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Tenant queue was at capacity when the global slot pool was saturated.
    ///
    /// The facade's public `check_and_consume` surfaces this as
    /// `Verdict::Rejected` rather than an `Err`; this variant exists for
    /// internal call sites that need to propagate the failure with `?`.
    #[error("tenant queue is full")]
    QueueFull,

    /// The engine is shutting down; no further work will be admitted.
    #[error("rate limiter is shutting down")]
    ShuttingDown,

    /// Unexpected invariant violation. A single tenant's failure here must
    /// never take down the engine for other tenants.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Configuration-related errors raised by the Config Store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `max_requests` was zero, or `window_duration` was non-positive.
    #[error("invalid quota: {0}")]
    InvalidQuota(String),

    /// `max_global_concurrent` or `max_tenant_queue_size` was non-positive.
    #[error("invalid global configuration: {0}")]
    InvalidGlobal(String),

    /// Missing required field on a builder.
    #[error("missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = RateLimitError::InvalidInput("tenant_id must not be empty".into());
        assert_eq!(err.to_string(), "invalid input: tenant_id must not be empty");

        let err = RateLimitError::NoQuota;
        assert_eq!(err.to_string(), "no quota configured for this key");
    }

    #[test]
    fn test_config_error_conversion() {
        let config_err = ConfigError::InvalidQuota("max_requests must be >= 1".into());
        let err: RateLimitError = config_err.clone().into();
        assert!(matches!(err, RateLimitError::Config(e) if e == config_err));
    }

    #[test]
    fn test_queue_full_display() {
        assert_eq!(RateLimitError::QueueFull.to_string(), "tenant queue is full");
        assert_eq!(
            RateLimitError::ShuttingDown.to_string(),
            "rate limiter is shutting down"
        );
    }
}
