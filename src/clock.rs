//! Time sources for window computations.
//!
//! The Window Registry and Load Manager only ever see `now` as an
//! explicit `f64` seconds value, so the engine stays fully deterministic
//! under test. [`SystemClock`] supplies that value from a monotonic
//! instant in production; [`ManualClock`] lets tests drive it directly,
//! matching scenarios S1–S6 in the specification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// A source of monotonic seconds, used for all window-slide arithmetic.
///
/// Implementations must be monotonically non-decreasing; the Window
/// Registry's invariants depend on it.
pub trait Clock: Send + Sync + 'static {
    /// Current time in seconds, relative to an arbitrary but fixed origin.
    fn now_secs(&self) -> f64;
}

/// The default clock: wall-clock-independent, backed by [`Instant`].
///
/// `reset_time_seconds` reported to external callers should be computed by
/// the embedder from this relative value plus a wall-clock reading taken
/// once at startup; the engine itself never needs to know the actual wall
/// time, only elapsed monotonic seconds.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a new system clock anchored to the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A manually-advanced clock for deterministic tests.
///
/// Stores time as bit-pattern `u64` in an atomic so `advance`/`set` are
/// lock-free and safe to call from concurrent test tasks.
#[derive(Debug)]
pub struct ManualClock {
    now_bits: AtomicU64,
}

impl ManualClock {
    /// Create a clock starting at `t = 0`.
    pub fn new() -> Self {
        Self {
            now_bits: AtomicU64::new(0f64.to_bits()),
        }
    }

    /// Create a clock starting at the given time.
    pub fn at(start: f64) -> Self {
        Self {
            now_bits: AtomicU64::new(start.to_bits()),
        }
    }

    /// Set the clock to an absolute time.
    pub fn set(&self, t: f64) {
        self.now_bits.store(t.to_bits(), Ordering::SeqCst);
    }

    /// Advance the clock by `delta` seconds.
    pub fn advance(&self, delta: f64) {
        let current = f64::from_bits(self.now_bits.load(Ordering::SeqCst));
        self.set(current + delta);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_secs(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::SeqCst))
    }
}
