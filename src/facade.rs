//! Rate Limiter Facade: the single entry point callers use.
//!
//! Wires the Config Store, Load Manager, and Window Registry together in
//! the order the specification mandates: resolve quota, acquire (or
//! queue for) a slot, consult the window, release the slot.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConfigStore, GlobalLimits};
use crate::decision::{RejectReason, Verdict};
use crate::error::{RateLimitError, Result};
use crate::key::RateKey;
use crate::load::{EnqueueOutcome, LoadManager, PendingRequest, SlotGuard};
use crate::quota::Quota;
use crate::window::WindowRegistry;

/// Top-level rate limiting engine.
///
/// Cheap to clone (an `Arc` around shared state); the dispatcher is
/// spawned once, at construction, and runs for the lifetime of the
/// returned handle.
#[derive(Clone)]
pub struct RateLimiter {
    config: Arc<ConfigStore>,
    window: Arc<WindowRegistry>,
    load: Arc<LoadManager>,
    clock: Arc<dyn Clock>,
}

impl RateLimiter {
    /// Build a rate limiter with the given global concurrency limits,
    /// using the real system clock, and start its dispatcher.
    pub fn new(global: GlobalLimits) -> Self {
        Self::with_clock(global, Arc::new(SystemClock::new()))
    }

    /// Build a rate limiter against an explicit [`Clock`] — primarily for
    /// tests that need deterministic time.
    pub fn with_clock(global: GlobalLimits, clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(ConfigStore::new(global));
        let window = Arc::new(WindowRegistry::new());
        let load = Arc::new(LoadManager::new(config.clone(), window.clone(), clock.clone()));
        load.spawn_dispatcher();
        Self {
            config,
            window,
            load,
            clock,
        }
    }

    /// Read-only access to the Config Store, for administrative wiring.
    pub fn config(&self) -> &Arc<ConfigStore> {
        &self.config
    }

    /// Signal the dispatcher to drain and stop. Already-queued requests
    /// are rejected with `ShuttingDown`; in-flight work completes
    /// normally.
    pub fn shutdown(&self) {
        self.load.shutdown();
    }

    /// Decide whether a request is admitted, queued, or rejected.
    ///
    /// 1. Validates `tenant`/`client`/`action` are non-empty.
    /// 2. Resolves the effective quota via the Config Store.
    /// 3. Attempts to acquire a slot from the Load Manager:
    ///    - if acquired, consults the Window Registry synchronously and
    ///      always releases the slot afterward;
    ///    - if not, enqueues the request and awaits the dispatcher's
    ///      verdict, or returns `Rejected{queue_full}` immediately if the
    ///      tenant's queue was already full.
    #[tracing::instrument(skip(self, fallback_quota), fields(tenant, client, action))]
    pub async fn check_and_consume(
        &self,
        tenant: &str,
        client: &str,
        action: &str,
        fallback_quota: Option<Quota>,
    ) -> Result<Verdict> {
        let key = RateKey::try_new(tenant, client, action)?;
        let quota = self.config.resolve(tenant, client, action, fallback_quota)?;

        if self.load.try_acquire_slot() {
            let now = self.clock.now_secs();
            let (allowed, remaining, reset_at) = {
                let _guard = SlotGuard::new(&self.load);
                self.window.check_and_consume(&key, &quota, now)
            };
            return Ok(if allowed {
                Verdict::allowed(remaining, reset_at)
            } else {
                Verdict::denied(reset_at)
            });
        }

        let enqueued_at = self.clock.now_secs();
        let (pending, completion) = PendingRequest::new(key, quota, enqueued_at);
        match self.load.enqueue(pending).await {
            EnqueueOutcome::QueueFull => Ok(Verdict::Rejected {
                reason: RejectReason::QueueFull,
            }),
            EnqueueOutcome::Enqueued => completion
                .await
                .map_err(|_| RateLimitError::Internal("dispatcher dropped completion handle".into())),
        }
    }

    /// Read-only status check: resolves the effective quota and peeks the
    /// Window Registry without consuming a request or touching the Load
    /// Manager.
    pub fn status(
        &self,
        tenant: &str,
        client: &str,
        action: &str,
        fallback_quota: Option<Quota>,
    ) -> Result<(u64, f64)> {
        let key = RateKey::try_new(tenant, client, action)?;
        let quota = self.config.resolve(tenant, client, action, fallback_quota)?;
        let now = self.clock.now_secs();
        Ok(self.window.peek(&key, &quota, now))
    }
}
