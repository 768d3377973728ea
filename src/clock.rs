//! Clock abstraction used by the throttler and the in-memory store.

use std::time::{SystemTime, UNIX_EPOCH};

/// Clock abstraction so timing can be faked in tests.
pub trait Clock: Send + Sync + std::fmt::Debug {
    /// Current unix time, in whole seconds.
    fn now_unix(&self) -> u64;
}

/// Wall clock backed by `SystemTime::now()`.
///
/// Notes: bucket timestamps travel through a store shared by many processes,
/// so they must be wall-clock based; a monotonic clock would not agree across
/// process boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_unix(&self) -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
    }
}
