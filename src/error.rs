//! Error types for throttling operations.

use std::fmt;

/// Per-call error for a store-backed throttler, generic over the store's own
/// error type.
///
/// A store failure is never folded into a limiting decision: callers must be
/// able to tell "the bucket is empty" from "the store is down", or the
/// rate-limiting decision itself is corrupted.
#[derive(Debug, Clone)]
pub enum ThrottleError<E> {
    /// The shared store could not be reached or failed mid-operation.
    Store(E),
    /// Stored state exists under the bucket key but does not parse as a
    /// bucket (e.g. a foreign write clobbered a field).
    MalformedBucket {
        /// Store key the corrupt state lives under.
        key: String,
        /// Name of the field that failed to parse.
        field: &'static str,
    },
    /// The caller requested zero tokens, which has no meaningful decision.
    ZeroTokens,
}

impl<E: fmt::Display> fmt::Display for ThrottleError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store operation failed: {e}"),
            Self::MalformedBucket { key, field } => {
                write!(f, "stored bucket at {key:?} has unreadable field {field:?}")
            }
            Self::ZeroTokens => write!(f, "num_tokens must be > 0"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for ThrottleError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}

impl<E> ThrottleError<E> {
    /// Check if this error came from the store.
    pub fn is_store(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    /// Check if this error reports unreadable stored state.
    pub fn is_malformed_bucket(&self) -> bool {
        matches!(self, Self::MalformedBucket { .. })
    }

    /// Borrow the store error if present.
    pub fn as_store(&self) -> Option<&E> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }

    /// Extract the store error if this is a `Store` variant.
    pub fn into_store(self) -> Option<E> {
        match self {
            Self::Store(e) => Some(e),
            _ => None,
        }
    }
}
