//! Convenient re-exports for common Meterdown types.
pub use crate::{
    clock::{Clock, SystemClock},
    config::{ConfigError, ThrottlerConfig},
    error::ThrottleError,
    rate_limit::RateLimit,
    store::{InMemoryStore, KeyValueStore},
    throttler::{BucketThrottler, Throttler},
};
