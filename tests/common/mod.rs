#![allow(dead_code)]

use meterdown::Clock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Manually advanced clock; clones share the same time source.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn starting_at(secs: u64) -> Self {
        let clock = Self::default();
        clock.now.store(secs, Ordering::SeqCst);
        clock
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_unix(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
