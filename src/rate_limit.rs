//! The decision record returned by each consumption attempt.

use std::collections::HashMap;

/// Snapshot of a meter's capacity after one consumption attempt.
///
/// All counts are expressed in units of the requested token count, so a call
/// asking for 5 tokens against a 20-token bucket sees a capacity of 4
/// ([`hits_per_period`](Self::hits_per_period)).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RateLimit {
    hits: i64,
    remaining: i64,
    period: u64,
    hits_per_period: i64,
    warning: bool,
    limited: bool,
}

impl RateLimit {
    pub(crate) fn new(
        hits: i64,
        remaining: i64,
        period: u64,
        hits_per_period: i64,
        limited: bool,
        warning: bool,
    ) -> Self {
        Self { hits, remaining, period, hits_per_period, warning, limited }
    }

    /// Capacity consumed so far, in request-sized units.
    pub fn hits(&self) -> i64 {
        self.hits
    }

    /// Request-sized units left after this consumption, floored at zero.
    pub fn remaining(&self) -> i64 {
        self.remaining
    }

    /// Refill period, in seconds.
    pub fn period(&self) -> u64 {
        self.period
    }

    /// Full-bucket capacity in request-sized units.
    pub fn hits_per_period(&self) -> i64 {
        self.hits_per_period
    }

    /// True if this consumption was rejected.
    pub fn is_limited(&self) -> bool {
        self.limited
    }

    /// True if remaining capacity dropped to the warning threshold, or the
    /// call was rejected.
    pub fn is_warning(&self) -> bool {
        self.warning
    }

    /// Flat key/value export, matching the stored-field string convention.
    pub fn to_map(&self) -> HashMap<&'static str, String> {
        HashMap::from([
            ("hits", self.hits.to_string()),
            ("remaining", self.remaining.to_string()),
            ("period", self.period.to_string()),
            ("hits_per_period", self.hits_per_period.to_string()),
            ("warning", self.warning.to_string()),
            ("limited", self.limited.to_string()),
        ])
    }
}
