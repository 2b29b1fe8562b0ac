//! Verdict types returned by the rate limiting engine.
//!
//! Every call into the [`RateLimiter`](crate::facade::RateLimiter) facade
//! terminates in exactly one [`Verdict`]. `Queued` is an intermediate state
//! only ever observed transiently by administrative introspection; callers
//! of `check_and_consume` always receive `Processed` or `Rejected`.

use serde::{Deserialize, Serialize};

/// The terminal result of a rate-limit decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Verdict {
    /// The Window Registry was consulted and produced a decision.
    Processed {
        /// Whether the request was admitted.
        allowed: bool,
        /// Requests remaining in the current window (0 when denied).
        remaining: u64,
        /// When (in the same clock base as the call) the window next has
        /// room — either `now + window` on an admit, or the time the
        /// oldest retained timestamp expires on a denial.
        reset_at: f64,
    },

    /// The request was buffered on a tenant queue awaiting a free slot.
    ///
    /// This variant is never the final state observed by a caller of
    /// `check_and_consume` — it exists so administrative snapshots of
    /// in-flight work can be described with the same type.
    Queued,

    /// The engine declined to process the request at all.
    Rejected {
        /// Why the request was rejected.
        reason: RejectReason,
    },
}

impl Verdict {
    /// Convenience constructor for an admitted request.
    pub fn allowed(remaining: u64, reset_at: f64) -> Self {
        Self::Processed {
            allowed: true,
            remaining,
            reset_at,
        }
    }

    /// Convenience constructor for a quota-denied request.
    pub fn denied(reset_at: f64) -> Self {
        Self::Processed {
            allowed: false,
            remaining: 0,
            reset_at,
        }
    }

    /// `true` for `Processed { allowed: true, .. }`.
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Processed { allowed: true, .. })
    }

    /// `true` for `Rejected { .. }`.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Why a request was rejected outright, as distinct from a normal quota
/// denial (`Verdict::Processed { allowed: false, .. }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    /// The tenant's wait queue was already at `max_tenant_queue_size` when
    /// the global slot pool was saturated.
    QueueFull,
    /// The request was still queued when shutdown was signaled.
    ShuttingDown,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::QueueFull => write!(f, "queue_full"),
            Self::ShuttingDown => write!(f, "shutting_down"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_allowed() {
        let v = Verdict::allowed(9, 60.0);
        assert!(v.is_allowed());
        assert!(!v.is_rejected());
        assert_eq!(v, Verdict::Processed { allowed: true, remaining: 9, reset_at: 60.0 });
    }

    #[test]
    fn test_verdict_denied() {
        let v = Verdict::denied(60.0);
        assert!(!v.is_allowed());
        match v {
            Verdict::Processed { allowed, remaining, .. } => {
                assert!(!allowed);
                assert_eq!(remaining, 0);
            }
            _ => panic!("expected Processed"),
        }
    }

    #[test]
    fn test_verdict_rejected() {
        let v = Verdict::Rejected { reason: RejectReason::QueueFull };
        assert!(v.is_rejected());
        assert!(!v.is_allowed());
        assert_eq!(RejectReason::QueueFull.to_string(), "queue_full");
        assert_eq!(RejectReason::ShuttingDown.to_string(), "shutting_down");
    }
}
