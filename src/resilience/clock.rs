//! Time source for the circuit breaker.
//!
//! # Responsibilities
//! - Provide the current timestamp used to stamp `Open` and to decide when
//!   the reset timeout has elapsed
//! - Allow tests and simulations to control time explicitly
//!
//! # Design Decisions
//! - Timestamps are plain milliseconds; only ordering and addition matter
//! - The wall clock is the default, a manual clock is swapped in for tests

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Milliseconds on the breaker's clock.
pub type Timestamp = u64;

/// Capability to read the current time.
///
/// Implementations must be monotonically non-decreasing for the breaker to
/// behave sensibly.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Wall-clock time, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// A clock that only moves when told to.
///
/// Cloning shares the underlying time, so a test can keep one handle and
/// hand another to the breaker.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Create a clock reading `start` milliseconds.
    pub fn new(start: Timestamp) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(start)),
        }
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jump to an absolute time.
    pub fn set(&self, to: Timestamp) {
        self.millis.store(to, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.millis.load(Ordering::SeqCst)
    }
}
