#![forbid(unsafe_code)]
#![deny(warnings)]
#![cfg_attr(not(test), deny(clippy::all))]

//! # Meterdown
//!
//! Distributed token-bucket rate limiting over a shared key-value store.
//!
//! Each caller ("meter") owns a bucket of tokens persisted in the store.
//! Consuming a token answers three questions at once: may this unit of work
//! proceed, how much capacity remains, and is the caller close to its limit.
//! Refill is computed lazily from elapsed wall-clock time on every call, so
//! many independent processes can share one set of buckets with no
//! coordinator and no background timers.
//!
//! ## Features
//!
//! - **Lazy refill**: whole elapsed periods are credited at read time
//! - **Pluggable storage** via the [`KeyValueStore`] trait (any hash-capable
//!   store works; [`InMemoryStore`] ships for local use and tests)
//! - **Soft warning threshold** ahead of hard limiting, for caller back-off
//! - **Idle reclamation** through the store's absolute expiry
//! - **Fakeable time** for deterministic tests
//!
//! ## Quick Start
//!
//! ```rust
//! use meterdown::{BucketThrottler, InMemoryStore, Throttler, ThrottlerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let throttler = BucketThrottler::new(InMemoryStore::new(), ThrottlerConfig::default());
//!
//!     let decision = throttler.consume("api-key-123", 1).await.unwrap();
//!     assert!(!decision.is_limited());
//!     assert_eq!(decision.remaining(), 19);
//! }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod prelude;
pub mod rate_limit;
pub mod store;
pub mod throttler;

// Re-exports
pub use clock::{Clock, SystemClock};
pub use config::{ConfigError, ThrottlerConfig};
pub use error::ThrottleError;
pub use rate_limit::RateLimit;
pub use store::{InMemoryStore, KeyValueStore, StorePoisoned};
pub use throttler::{BucketThrottler, Throttler, KEY_PREFIX};
