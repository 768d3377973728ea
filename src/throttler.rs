//! Token-bucket throttling over a shared key-value store.

use crate::clock::{Clock, SystemClock};
use crate::config::ThrottlerConfig;
use crate::error::ThrottleError;
use crate::rate_limit::RateLimit;
use crate::store::KeyValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

/// Namespace prefix for bucket keys in the shared store.
///
/// Part of the observable contract: every meter id maps to exactly one key,
/// and distinct meter ids never alias.
pub const KEY_PREFIX: &str = "rate_limiter:";

const FIELD_VALUE: &str = "value";
const FIELD_LAST_UPDATE: &str = "last_update";

/// Core interface for rate limiting logic.
///
/// This trait decouples callers from the backing strategy, so a store-backed
/// [`BucketThrottler`] and, say, a purely local limiter are interchangeable.
#[async_trait]
pub trait Throttler: Send + Sync {
    /// Error type for consumption attempts.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Attempt to consume `num_tokens` from the meter's bucket.
    async fn consume(&self, meter_id: &str, num_tokens: u32) -> Result<RateLimit, Self::Error>;
}

/// One meter's persisted state: a token count and the unix time it was last
/// written. `value` may go negative when a multi-token request overshoots;
/// rejections never move it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Bucket {
    value: i64,
    last_update: u64,
}

impl Bucket {
    fn to_fields(self) -> HashMap<String, String> {
        HashMap::from([
            (FIELD_VALUE.to_string(), self.value.to_string()),
            (FIELD_LAST_UPDATE.to_string(), self.last_update.to_string()),
        ])
    }

    fn from_fields<E>(key: &str, fields: &HashMap<String, String>) -> Result<Self, ThrottleError<E>> {
        Ok(Self {
            value: parse_field(key, fields, FIELD_VALUE)?,
            last_update: parse_field(key, fields, FIELD_LAST_UPDATE)?,
        })
    }
}

fn parse_field<T: FromStr, E>(
    key: &str,
    fields: &HashMap<String, String>,
    field: &'static str,
) -> Result<T, ThrottleError<E>> {
    fields
        .get(field)
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ThrottleError::MalformedBucket { key: key.to_string(), field })
}

/// Token-bucket rate limiter backed by a shared [`KeyValueStore`].
///
/// Refill is lazy: each call credits `floor(elapsed / refill_time)` whole
/// periods of `refill_amount` tokens, capped at `bucket_size`, so no
/// background timer is needed. Buckets are created full on first touch and
/// reclaimed by the store's expiry once a meter goes idle.
///
/// Clones share the same store handle and configuration.
///
/// # Atomicity
///
/// The read-refill-write-expire sequence is **not** atomic: two calls racing
/// on the same meter id can read the same snapshot and both be admitted,
/// over-admitting past capacity. This mirrors the store contract, which has
/// no multi-operation transaction. Deployments that need strict admission
/// under contention must wrap the sequence in a server-side scripted
/// operation instead.
#[derive(Debug)]
pub struct BucketThrottler<S> {
    store: Arc<S>,
    config: ThrottlerConfig,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for BucketThrottler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S> BucketThrottler<S>
where
    S: KeyValueStore,
{
    /// Create a throttler over `store` with a validated configuration.
    pub fn new(store: S, config: ThrottlerConfig) -> Self {
        Self { store: Arc::new(store), config, clock: Arc::new(SystemClock) }
    }

    /// Override the clock (useful for deterministic tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// The configuration this throttler enforces.
    pub fn config(&self) -> &ThrottlerConfig {
        &self.config
    }

    /// Store key for a meter id.
    pub fn meter_key(meter_id: &str) -> String {
        format!("{KEY_PREFIX}{meter_id}")
    }

    /// Attempt to consume `num_tokens`, with the full wire-level signature.
    ///
    /// `warn_threshold` is reserved: the wire contract carries it for a
    /// future per-call threshold override, but nothing reads it yet and it
    /// must not be repurposed. `at` overrides
    /// "now" (unix seconds) for deterministic testing and defaults to the
    /// configured clock.
    ///
    /// # Errors
    /// - [`ThrottleError::ZeroTokens`] if `num_tokens == 0`.
    /// - [`ThrottleError::Store`] if any store round-trip fails. If the
    ///   failure happens after the decision was computed, the decision is
    ///   discarded and the error surfaces instead.
    /// - [`ThrottleError::MalformedBucket`] if stored state does not parse.
    pub async fn consume_at(
        &self,
        meter_id: &str,
        warn_threshold: u32,
        num_tokens: u32,
        at: Option<u64>,
    ) -> Result<RateLimit, ThrottleError<S::Error>> {
        let _ = warn_threshold; // reserved, see doc comment
        if num_tokens == 0 {
            return Err(ThrottleError::ZeroTokens);
        }

        let now = at.unwrap_or_else(|| self.clock.now_unix());
        let key = Self::meter_key(meter_id);
        let bucket = self.retrieve_bucket(&key, now).await?;

        let bucket_size = i64::from(self.config.bucket_size());
        let refill_secs = self.config.refill_time().as_secs();

        // Whole refill periods elapsed since the last write.
        let refill_count = now.saturating_sub(bucket.last_update) / refill_secs;
        let refilled = bucket_size
            .min(bucket.value + refill_count as i64 * i64::from(self.config.refill_amount()));

        let mut limited = false;
        let mut warning = false;
        let mut new_value = refilled;
        if new_value <= 0 {
            // Exhausted: reject without touching the count.
            limited = true;
            warning = true;
        } else {
            new_value -= i64::from(num_tokens);
        }
        if new_value <= i64::from(self.config.warning_limit()) {
            warning = true;
        }

        // Advance by exactly the periods credited, never past "now".
        let new_last_update = now.min(bucket.last_update + refill_count * refill_secs);

        let next = Bucket { value: new_value, last_update: new_last_update };
        self.store.write_fields(&key, next.to_fields()).await.map_err(ThrottleError::Store)?;
        self.store
            .expire_at(&key, now + self.expiry_window())
            .await
            .map_err(ThrottleError::Store)?;

        tracing::debug!(meter_id, new_value, refill_count, limited, warning, "consumed");

        let per_request = i64::from(num_tokens);
        Ok(RateLimit::new(
            (bucket_size - new_value) / per_request,
            (new_value as f64 / per_request as f64).round().max(0.0) as i64,
            refill_secs,
            (bucket_size + per_request - 1) / per_request,
            limited,
            warning,
        ))
    }

    /// Read the meter's bucket, creating it at full capacity on first touch.
    async fn retrieve_bucket(
        &self,
        key: &str,
        now: u64,
    ) -> Result<Bucket, ThrottleError<S::Error>> {
        let exists =
            self.store.field_exists(key, FIELD_VALUE).await.map_err(ThrottleError::Store)?;
        if !exists {
            let bucket =
                Bucket { value: i64::from(self.config.bucket_size()), last_update: now };
            self.store.write_fields(key, bucket.to_fields()).await.map_err(ThrottleError::Store)?;
            tracing::debug!(key, "initialized bucket at full capacity");
            return Ok(bucket);
        }
        let fields = self.store.read_fields(key).await.map_err(ThrottleError::Store)?;
        Bucket::from_fields(key, &fields)
    }

    /// Seconds until an untouched key may be reclaimed: long enough that a
    /// drained bucket fully refills first, so expiry never resets live state.
    fn expiry_window(&self) -> u64 {
        let refill_periods = 1
            + u64::from(self.config.bucket_size()).div_ceil(u64::from(self.config.refill_amount()));
        refill_periods * self.config.refill_time().as_secs()
    }
}

#[async_trait]
impl<S> Throttler for BucketThrottler<S>
where
    S: KeyValueStore + 'static,
{
    type Error = ThrottleError<S::Error>;

    async fn consume(&self, meter_id: &str, num_tokens: u32) -> Result<RateLimit, Self::Error> {
        self.consume_at(meter_id, 0, num_tokens, None).await
    }
}
