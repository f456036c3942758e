//! The query cache itself: status-tracked entries and single-flight fetches.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::key::QueryKey;
use crate::error::ClientError;

/// Lifecycle of a cached entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// A fetch is in flight for this key.
    Loading,
    /// Value is current as of `fetched_at`.
    Ready,
    /// Invalidated; refetched on next access.
    Stale,
    /// Last fetch failed; retried on next access.
    Failed,
}

/// One cached entry. `value` holds the previous value while loading or stale
/// so readers can keep rendering it.
#[derive(Debug, Clone)]
pub struct CachedQuery {
    pub status: QueryStatus,
    pub value: Value,
    pub fetched_at: DateTime<Utc>,
}

impl CachedQuery {
    fn with_status(status: QueryStatus, value: Value) -> Self {
        Self {
            status,
            value,
            fetched_at: Utc::now(),
        }
    }

    /// Ready with a non-null value: the record exists on chain.
    pub fn is_present(&self) -> bool {
        self.status == QueryStatus::Ready && !self.value.is_null()
    }
}

/// Shared cache of dependent queries.
///
/// Reads are lock-free; fetches for the same key are serialized through a
/// per-key async mutex so concurrent callers coalesce into one transport
/// call. The whole map is dropped on cluster switch or disconnect.
#[derive(Default)]
pub struct QueryCache {
    entries: DashMap<QueryKey, CachedQuery>,
    inflight: DashMap<QueryKey, Arc<Mutex<()>>>,
    // Bumped on every clear. A fetch started under an older generation must
    // not write its result back into the reset cache.
    generation: AtomicU64,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value, or run `fetch` to populate it.
    ///
    /// Single-flight: a caller that loses the per-key race waits for the
    /// winner and then reads the stored value without issuing a second
    /// fetch. A failed fetch marks the entry [`QueryStatus::Failed`] and the
    /// next caller retries.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &QueryKey,
        fetch: F,
    ) -> Result<Value, ClientError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, ClientError>>,
    {
        if let Some(entry) = self.entries.get(key) {
            if entry.status == QueryStatus::Ready {
                return Ok(entry.value.clone());
            }
        }

        let lock = self
            .inflight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let _guard = lock.lock().await;

        // The winner of the race may have stored a fresh value while we
        // waited on the lock.
        if let Some(entry) = self.entries.get(key) {
            if entry.status == QueryStatus::Ready {
                return Ok(entry.value.clone());
            }
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let previous = self
            .entries
            .get(key)
            .map(|entry| entry.value.clone())
            .unwrap_or(Value::Null);
        self.entries.insert(
            key.clone(),
            CachedQuery::with_status(QueryStatus::Loading, previous.clone()),
        );

        match fetch().await {
            Ok(value) => {
                if self.generation.load(Ordering::SeqCst) == generation {
                    debug!(%key, "query fetched");
                    self.entries.insert(
                        key.clone(),
                        CachedQuery::with_status(QueryStatus::Ready, value.clone()),
                    );
                } else {
                    debug!(%key, "cache reset while fetching, result not stored");
                }
                Ok(value)
            }
            Err(err) => {
                warn!(%key, %err, "query fetch failed");
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.entries.insert(
                        key.clone(),
                        CachedQuery::with_status(QueryStatus::Failed, previous),
                    );
                }
                Err(err)
            }
        }
    }

    /// Snapshot of an entry without scheduling a fetch.
    pub fn peek(&self, key: &QueryKey) -> Option<CachedQuery> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    /// Mark one entry stale.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.status = QueryStatus::Stale;
        }
    }

    /// Mark every entry whose key matches the predicate stale.
    pub fn invalidate_where(&self, predicate: impl Fn(&QueryKey) -> bool) {
        for mut entry in self.entries.iter_mut() {
            if predicate(entry.key()) {
                entry.value_mut().status = QueryStatus::Stale;
            }
        }
    }

    /// Drop everything. Used on cluster switch and wallet disconnect.
    ///
    /// Fetches still in flight complete, but their results are dropped
    /// rather than stored, so nothing keyed by the old identity or cluster
    /// can reappear.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
        self.inflight.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
