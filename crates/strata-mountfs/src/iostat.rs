//! Rolling two-sample I/O telemetry per mountpath.
//!
//! Each mountpath record owns one cell holding the previous and current
//! sample of two scalar metrics: disk utilization and queue length.
//! The cell is written in bulk by the telemetry feed and read by
//! schedulers without touching any registry-wide lock.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// A two-sample rolling window over one scalar metric.
///
/// `curr` is the most recent sample; `prev` is the sample immediately
/// before it, or zero if only one sample has ever been written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RollingPair {
    /// The sample preceding `curr`.
    pub prev: f64,
    /// The most recent sample.
    pub curr: f64,
}

impl RollingPair {
    fn shift(&mut self, next: f64) {
        self.prev = self.curr;
        self.curr = next;
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct CellInner {
    util: RollingPair,
    queue: RollingPair,
}

/// Telemetry cell guarding the utilization and queue-length windows.
///
/// Both metrics are shifted under one short critical section, so a
/// reader never observes a state where one metric was updated and the
/// other was not. Ordering between successive `set` calls is the
/// caller's responsibility; the registry funnels all writes from a
/// single telemetry source.
#[derive(Debug, Default)]
pub struct IostatCell {
    inner: Mutex<CellInner>,
}

impl IostatCell {
    /// Create a cell with both windows zeroed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new sample pair, shifting both windows.
    pub fn set(&self, util: f64, queue: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.util.shift(util);
        inner.queue.shift(queue);
    }

    /// Returns value copies of the `(utilization, queue-length)` windows.
    pub fn get(&self) -> (RollingPair, RollingPair) {
        let inner = self.inner.lock().unwrap();
        (inner.util, inner.queue)
    }
}
