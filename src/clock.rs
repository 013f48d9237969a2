use chrono::Utc;
use std::sync::Arc;

/// Clock
///
/// Source of the current instant used for the session expiry check.
pub trait Clock: Send + Sync {
    /// Current time in epoch milliseconds.
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by `chrono`.
#[derive(Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock frozen at a given instant, for deterministic tests.
#[derive(Clone, Copy, Debug)]
pub struct FixedClock {
    pub millis: i64,
}

impl FixedClock {
    pub fn at(millis: i64) -> Self {
        Self { millis }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.millis
    }
}

pub type ClockState = Arc<dyn Clock>;
