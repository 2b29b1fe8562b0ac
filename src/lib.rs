//! Multi-tenant rate limiting engine core.
//!
//! `tenant_ratelimit` is the in-memory decision engine behind a
//! multi-tenant API gateway's admission control: given a (tenant, client,
//! action) identity and a quota, it decides whether a request is
//! admitted now, deferred behind a fairness queue, or rejected outright,
//! while holding a global cap on in-flight work.
//!
//! Three components do the work:
//!
//! - [`window`] — a sliding-window log per key, enforcing quotas at
//!   sub-second precision.
//! - [`config`] — composes global defaults, per-tenant-action limits, and
//!   per-client overrides into one effective quota per lookup.
//! - [`load`] — caps global concurrency and drains per-tenant wait queues
//!   under round-robin fairness.
//!
//! [`facade::RateLimiter`] wires the three together behind a single
//! entry point.
//!
//! # Quick Start
//!
//! ```
//! use tenant_ratelimit::{GlobalLimits, Quota, RateLimiter};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() {
//!     let limiter = RateLimiter::new(GlobalLimits::new(64, 32).unwrap());
//!     limiter
//!         .config()
//!         .set_action_limit("tenant-a", "login", Quota::new(5, Duration::from_secs(60)).unwrap());
//!
//!     let verdict = limiter
//!         .check_and_consume("tenant-a", "client-1", "login", None)
//!         .await
//!         .unwrap();
//!
//!     if verdict.is_allowed() {
//!         println!("admitted");
//!     }
//! }
//! ```
//!
//! This crate has no knowledge of HTTP, persistence, or clustering — it
//! is the core decision engine an embedding transport layer drives.

pub mod clock;
pub mod config;
pub mod decision;
pub mod error;
pub mod facade;
pub mod key;
pub mod load;
pub mod quota;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ActionLimitEntry, ClientLimitEntry, ConfigSnapshot, ConfigStore, GlobalLimits};
pub use decision::{RejectReason, Verdict};
pub use error::{ConfigError, RateLimitError, Result};
pub use facade::RateLimiter;
pub use key::RateKey;
pub use load::{EnqueueOutcome, LoadManager, PendingRequest};
pub use quota::Quota;
pub use window::WindowRegistry;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::config::{ConfigStore, GlobalLimits};
    pub use crate::decision::{RejectReason, Verdict};
    pub use crate::error::{RateLimitError, Result};
    pub use crate::facade::RateLimiter;
    pub use crate::key::RateKey;
    pub use crate::quota::Quota;
}
