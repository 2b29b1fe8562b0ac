//! Window Registry: per-key sliding-window quota enforcement.
//!
//! The registry owns one [`SlidingLog`] per [`RateKey`], lazily created on
//! first reference and never destroyed for the lifetime of the process —
//! entries evict themselves as their windows slide. Two concurrent
//! operations against the same key always serialize through that key's
//! own lock; operations on distinct keys never contend with each other.

use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::key::RateKey;
use crate::quota::Quota;

/// A bounded, monotonically-trimmed sequence of admit timestamps.
type SlidingLog = VecDeque<f64>;

/// Owns one sliding-window log per [`RateKey`].
///
/// Grounded on the same lazy-insert-under-a-concurrent-map pattern the
/// teacher library uses for its per-key semaphores
/// (`ConcurrentLimiter::try_acquire`): a `DashMap` shards the lock so
/// unrelated keys never block each other, and `entry().or_insert_with()`
/// collapses concurrent first-touches of the same key into one creation.
#[derive(Debug, Default)]
pub struct WindowRegistry {
    logs: DashMap<RateKey, Arc<Mutex<SlidingLog>>>,
}

impl WindowRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            logs: DashMap::new(),
        }
    }

    /// Number of distinct keys this registry has ever tracked.
    ///
    /// Logs are never removed, so this only grows; useful for tests and
    /// administrative introspection.
    pub fn tracked_keys(&self) -> usize {
        self.logs.len()
    }

    fn log_for(&self, key: &RateKey) -> Arc<Mutex<SlidingLog>> {
        self.logs
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::trace!(%key, "window registry: creating sliding log");
                Arc::new(Mutex::new(VecDeque::new()))
            })
            .clone()
    }

    /// Drop every timestamp `s` with `s <= now - window` from the front of
    /// `log`. Timestamps are pushed in non-decreasing order, so expired
    /// entries are always a prefix.
    fn evict_expired(log: &mut SlidingLog, now: f64, window: f64) {
        let cutoff = now - window;
        while matches!(log.front(), Some(&front) if front <= cutoff) {
            log.pop_front();
        }
    }

    /// Check whether a request at `now` is admitted under `quota`, and if
    /// so, record it.
    ///
    /// Returns `(allowed, remaining, reset_at)`. `remaining` counts
    /// requests still admittable in the current window *after* this one;
    /// `reset_at` is `now + window` when admitted, or the instant the
    /// oldest retained timestamp expires when denied.
    pub fn check_and_consume(&self, key: &RateKey, quota: &Quota, now: f64) -> (bool, u64, f64) {
        let window = quota.window_secs();
        let limit = quota.max_requests();
        let log_handle = self.log_for(key);
        let mut log = log_handle.lock();

        Self::evict_expired(&mut log, now, window);

        let current_count = log.len() as u64;
        if current_count < limit {
            log.push_back(now);
            let remaining = limit - current_count - 1;
            let reset_at = now + window;
            (true, remaining, reset_at)
        } else {
            tracing::debug!(%key, "window registry: quota denied");
            let oldest = *log.front().expect("current_count >= limit >= 1 implies non-empty log");
            (false, 0, oldest + window)
        }
    }

    /// Read-only equivalent of [`WindowRegistry::check_and_consume`]: trims
    /// expired entries but never appends, so repeated calls with no
    /// intervening consume are idempotent.
    pub fn peek(&self, key: &RateKey, quota: &Quota, now: f64) -> (u64, f64) {
        let window = quota.window_secs();
        let limit = quota.max_requests();
        let log_handle = self.log_for(key);
        let mut log = log_handle.lock();

        Self::evict_expired(&mut log, now, window);

        let current_count = log.len() as u64;
        let remaining = limit.saturating_sub(current_count);
        let reset_at = if current_count < limit {
            now + window
        } else {
            let oldest = *log.front().expect("current_count >= limit >= 1 implies non-empty log");
            oldest + window
        };
        (remaining, reset_at)
    }
}
