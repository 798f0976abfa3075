//! `backendId` generation.
//!
//! Ids look like `b-<unix millis>-<counter>`. The counter alone makes every id
//! from one generator distinct; the timestamp keeps ids from separate runs
//! apart. Two processes writing the same file can still collide, since
//! nothing coordinates their counters.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Process-local id source. One per store; no globals.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last_ms: AtomicI64,
    counter: AtomicU64,
}

impl IdGenerator {
    /// Fresh generator with the counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Next id. Never repeats for the lifetime of this generator, and the
    /// millisecond part never goes backwards even if the wall clock does.
    pub fn next(&self) -> String {
        let now = chrono::Utc::now().timestamp_millis();
        let ms = self.last_ms.fetch_max(now, Ordering::SeqCst).max(now);
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("b-{ms}-{n}")
    }
}
