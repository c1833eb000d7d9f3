//! Bounded TTL entity cache for Agora.
//!
//! Caches materialized entities keyed by their record identity, with
//! lookup-on-miss through a caller-supplied async resolver. Expiry is
//! checked lazily on access (no background sweep); an optional capacity
//! bound evicts least-recently-used entries. Concurrent misses for the same
//! key are coalesced so the upstream fetch runs at most once per key at a
//! time.
//!
//! # Key Types
//!
//! - [`EntityCache`] — The cache itself, generic over the cached value
//! - [`CacheConfig`] — TTL and capacity settings
//! - [`CacheStats`] — Size and hit/miss counters
//! - [`CacheError`] — Miss-then-resolver-failure, reported as not-found

pub mod cache;
pub mod error;

pub use cache::{CacheConfig, CacheStats, EntityCache};
pub use error::{CacheError, CacheResult};
