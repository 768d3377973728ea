//! Validated throttler configuration.

use std::time::Duration;

/// Validated configuration for a token-bucket throttler.
///
/// Immutable after construction; a throttler instance never changes its
/// limits at runtime.
#[derive(Debug, Clone)]
pub struct ThrottlerConfig {
    bucket_size: u32,
    refill_time: Duration,
    refill_amount: u32,
    warning_limit: u32,
}

/// Errors produced when validating throttler configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Bucket capacity must be > 0.
    InvalidBucketSize {
        /// Value provided by caller.
        provided: u32,
    },
    /// Refill period must be at least one second.
    InvalidRefillTime(Duration),
    /// Tokens credited per period must be > 0.
    InvalidRefillAmount {
        /// Value provided by caller.
        provided: u32,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidBucketSize { provided } => {
                write!(f, "bucket_size must be > 0 (got {provided})")
            }
            ConfigError::InvalidRefillTime(period) => {
                write!(f, "refill_time must be at least 1s (got {period:?})")
            }
            ConfigError::InvalidRefillAmount { provided } => {
                write!(f, "refill_amount must be > 0 (got {provided})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

impl ThrottlerConfig {
    /// Create a config with validation.
    ///
    /// `refill_time` has whole-second resolution: stored timestamps are unix
    /// seconds, so sub-second periods are rejected along with zero.
    ///
    /// # Examples
    /// ```
    /// use meterdown::ThrottlerConfig;
    /// use std::time::Duration;
    /// let cfg = ThrottlerConfig::new(20, Duration::from_secs(600), 10, 1).unwrap();
    /// assert_eq!(cfg.bucket_size(), 20);
    /// ```
    pub fn new(
        bucket_size: u32,
        refill_time: Duration,
        refill_amount: u32,
        warning_limit: u32,
    ) -> Result<Self, ConfigError> {
        if bucket_size == 0 {
            return Err(ConfigError::InvalidBucketSize { provided: bucket_size });
        }
        if refill_time.as_secs() == 0 {
            return Err(ConfigError::InvalidRefillTime(refill_time));
        }
        if refill_amount == 0 {
            return Err(ConfigError::InvalidRefillAmount { provided: refill_amount });
        }
        Ok(Self { bucket_size, refill_time, refill_amount, warning_limit })
    }

    /// Maximum tokens a bucket can hold.
    pub fn bucket_size(&self) -> u32 {
        self.bucket_size
    }

    /// Duration of one refill period.
    pub fn refill_time(&self) -> Duration {
        self.refill_time
    }

    /// Tokens credited per elapsed refill period.
    pub fn refill_amount(&self) -> u32 {
        self.refill_amount
    }

    /// Token level at or below which results carry the warning flag.
    pub fn warning_limit(&self) -> u32 {
        self.warning_limit
    }
}

impl Default for ThrottlerConfig {
    /// 20 tokens, refilled 10 at a time every 10 minutes, warning at 1.
    fn default() -> Self {
        Self {
            bucket_size: 20,
            refill_time: Duration::from_secs(600),
            refill_amount: 10,
            warning_limit: 1,
        }
    }
}
