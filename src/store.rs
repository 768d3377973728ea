//! Storage interface for bucket state.

use crate::clock::{Clock, SystemClock};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Abstract storage interface for bucket state.
///
/// Models the subset of a hash-capable key-value store the throttler needs:
/// read-all-fields, field-existence, multi-field write, absolute expiry. A
/// Redis hash satisfies it directly (`HGETALL` / `HEXISTS` / `HMSET` /
/// `EXPIREAT`); [`InMemoryStore`] is the process-local equivalent.
///
/// The contract offers no multi-operation atomicity; see
/// [`BucketThrottler`](crate::BucketThrottler) for the consequences.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// True if `key` exists and carries `field`.
    async fn field_exists(&self, key: &str, field: &str) -> Result<bool, Self::Error>;

    /// All fields of `key`; empty if the key is absent or expired.
    async fn read_fields(&self, key: &str) -> Result<HashMap<String, String>, Self::Error>;

    /// Write (upsert) the given fields of `key`, creating the key if needed.
    async fn write_fields(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<(), Self::Error>;

    /// Schedule `key` to vanish at the absolute unix time `deadline_unix`.
    ///
    /// Returns `false` if the key does not exist.
    async fn expire_at(&self, key: &str, deadline_unix: u64) -> Result<bool, Self::Error>;
}

/// Error raised when the in-memory store's lock was poisoned by a panicking
/// holder.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("in-memory store lock poisoned")]
pub struct StorePoisoned;

#[derive(Debug, Clone, Default)]
struct Entry {
    fields: HashMap<String, String>,
    expires_at: Option<u64>,
}

impl Entry {
    fn is_expired(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(deadline) if deadline <= now)
    }
}

/// Mutex-guarded in-memory store.
///
/// Clones share the same underlying map, so every handle observes the same
/// buckets. Expiry is enforced lazily: expired keys are dropped on the next
/// access rather than by a background sweeper.
#[derive(Debug, Clone)]
pub struct InMemoryStore {
    data: Arc<Mutex<HashMap<String, Entry>>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self { data: Arc::default(), clock: Arc::new(SystemClock) }
    }
}

impl InMemoryStore {
    /// Create an empty store on the system clock.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the clock (useful for deterministic expiry tests).
    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Drop the entry if its expiry has passed; returns whether it survives.
    fn purge_expired(guard: &mut HashMap<String, Entry>, key: &str, now: u64) -> bool {
        match guard.get(key) {
            Some(entry) if entry.is_expired(now) => {
                guard.remove(key);
                false
            }
            Some(_) => true,
            None => false,
        }
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    type Error = StorePoisoned;

    async fn field_exists(&self, key: &str, field: &str) -> Result<bool, Self::Error> {
        let now = self.clock.now_unix();
        let mut guard = self.data.lock().map_err(|_| StorePoisoned)?;
        if !Self::purge_expired(&mut guard, key, now) {
            return Ok(false);
        }
        Ok(guard.get(key).is_some_and(|entry| entry.fields.contains_key(field)))
    }

    async fn read_fields(&self, key: &str) -> Result<HashMap<String, String>, Self::Error> {
        let now = self.clock.now_unix();
        let mut guard = self.data.lock().map_err(|_| StorePoisoned)?;
        if !Self::purge_expired(&mut guard, key, now) {
            return Ok(HashMap::new());
        }
        Ok(guard.get(key).map(|entry| entry.fields.clone()).unwrap_or_default())
    }

    async fn write_fields(
        &self,
        key: &str,
        fields: HashMap<String, String>,
    ) -> Result<(), Self::Error> {
        let now = self.clock.now_unix();
        let mut guard = self.data.lock().map_err(|_| StorePoisoned)?;
        // A write to an expired key starts a fresh entry with no expiry.
        Self::purge_expired(&mut guard, key, now);
        guard.entry(key.to_string()).or_default().fields.extend(fields);
        Ok(())
    }

    async fn expire_at(&self, key: &str, deadline_unix: u64) -> Result<bool, Self::Error> {
        let now = self.clock.now_unix();
        let mut guard = self.data.lock().map_err(|_| StorePoisoned)?;
        if !Self::purge_expired(&mut guard, key, now) {
            return Ok(false);
        }
        if let Some(entry) = guard.get_mut(key) {
            entry.expires_at = Some(deadline_unix);
            return Ok(true);
        }
        Ok(false)
    }
}
