//! Cache module for storing API responses to disk
//!
//! Responses to idempotent reads are stored verbatim under a fingerprint of the
//! resource and its query string. Each entry expires according to the
//! response's `Cache-Control`/`Expires` headers, defaulting to one hour, and
//! an expired entry is removed the first time it is read.

mod expiry;
mod fingerprint;
mod manager;

pub(crate) use manager::write_atomic;

pub use expiry::{derive_expiration, DEFAULT_TTL_SECS};
pub use fingerprint::fingerprint;
pub use manager::{CacheEntry, CacheError, CacheLookup, ResponseCache};
