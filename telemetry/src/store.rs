//! View counter store
//!
//! Per-minute page-view counters behind a pluggable store trait. The store
//! contract is small on purpose: an atomic "add 1, default 0" update keyed by
//! the minute timestamp, and a range read. Counters are never decremented and
//! never deleted here - retention is the backing store's concern.

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::error;

/// Milliseconds per counter bucket.
pub const MINUTE_MS: u64 = 60_000;

/// One page-view counter bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageViewRecord {
    /// Bucket start, epoch milliseconds floored to the minute
    pub timestamp: u64,
    /// Number of views recorded in this minute
    pub count: u64,
}

/// Store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the operation
    #[error("view store unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// The atomic-increment/range-query contract the telemetry service needs.
///
/// Two concurrent `increment` calls for the same minute must both count:
/// the implementation is responsible for atomicity, the service makes no
/// ordering promise across callers.
#[async_trait]
pub trait ViewStore: Send + Sync {
    /// Atomically adds 1 to the counter for `timestamp`, creating it at 0
    /// first if absent.
    async fn increment(&self, timestamp: u64) -> Result<(), StoreError>;

    /// Returns all records with `timestamp >= cutoff`, in store-native order.
    async fn query_since(&self, cutoff: u64) -> Result<Vec<PageViewRecord>, StoreError>;
}

// ============================================================================
// TIME HELPERS AND COUNTER OPERATIONS
// ============================================================================

/// Current wall-clock time in epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Floors an epoch-millisecond timestamp to its minute bucket.
pub fn floor_to_minute(timestamp_ms: u64) -> u64 {
    timestamp_ms / MINUTE_MS * MINUTE_MS
}

/// Records one page view in the bucket containing `now`.
///
/// # Arguments
///
/// * `store` - The view store
/// * `now` - Current time in epoch milliseconds
///
/// # Returns
///
/// * `Ok(())` - Counter incremented
/// * `Err(StoreError)` - The store rejected the update (already logged)
pub async fn record_view(store: &dyn ViewStore, now: u64) -> Result<(), StoreError> {
    let bucket = floor_to_minute(now);
    store.increment(bucket).await.map_err(|e| {
        error!("Error recording page view: {}", e);
        e
    })
}

/// Lists the counters recorded within the trailing window.
///
/// # Arguments
///
/// * `store` - The view store
/// * `window_ms` - Window length in milliseconds
/// * `now` - Current time in epoch milliseconds
///
/// # Returns
///
/// * `Ok(Vec<PageViewRecord>)` - Records with `timestamp >= now - window_ms`
/// * `Err(StoreError)` - The store could not be read
pub async fn list_recent_views(
    store: &dyn ViewStore,
    window_ms: u64,
    now: u64,
) -> Result<Vec<PageViewRecord>, StoreError> {
    let cutoff = now.saturating_sub(window_ms);
    store.query_since(cutoff).await
}

// ============================================================================
// IN-MEMORY IMPLEMENTATION
// ============================================================================

/// In-memory view store for local development and tests.
pub struct MemoryViewStore {
    counters: RwLock<HashMap<u64, u64>>,
}

impl MemoryViewStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            counters: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryViewStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ViewStore for MemoryViewStore {
    async fn increment(&self, timestamp: u64) -> Result<(), StoreError> {
        let mut counters = self.counters.write().await;
        *counters.entry(timestamp).or_insert(0) += 1;
        Ok(())
    }

    async fn query_since(&self, cutoff: u64) -> Result<Vec<PageViewRecord>, StoreError> {
        let counters = self.counters.read().await;
        Ok(counters
            .iter()
            .filter(|(timestamp, _)| **timestamp >= cutoff)
            .map(|(timestamp, count)| PageViewRecord {
                timestamp: *timestamp,
                count: *count,
            })
            .collect())
    }
}
