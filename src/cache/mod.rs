//! # Cache Module
//!
//! Dependent-query cache: entries are keyed by operation, cluster, and the
//! resolved address inputs they depend on. A key cannot be constructed while
//! any input is unavailable, so a dependent query can never fire with a
//! placeholder. Fetches are coalesced per key; invalidation marks entries
//! stale for refetch on next access.

pub mod key;
pub mod store;

pub use key::QueryKey;
pub use store::{CachedQuery, QueryCache, QueryStatus};
