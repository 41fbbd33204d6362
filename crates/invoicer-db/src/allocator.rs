//! # Sequence Allocator
//!
//! Hands out per-scope sequence numbers: each call returns a value no other
//! call for the same scope has received or will receive.
//!
//! ## Allocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  allocate(scope)                                                        │
//! │       │                                                                 │
//! │       ▼        overall deadline: policy.timeout                         │
//! │  ┌──────────────────────────────────────────────────────────────┐      │
//! │  │  attempt 1: store.increment(scope)                            │      │
//! │  │     ├── Ok(n)            → return n                           │      │
//! │  │     ├── transient error  → sleep(backoff), attempt 2 ...      │      │
//! │  │     └── other error      → AllocationFailed                   │      │
//! │  │  after max_retries transient failures → AllocationFailed      │      │
//! │  └──────────────────────────────────────────────────────────────┘      │
//! │       │ deadline passed → Timeout                                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Gaps
//! A value is consumed the moment the store's increment commits. If the
//! caller later fails to persist its invoice, or an increment commits after
//! the deadline fired, that value is never reissued. Sequences are unique
//! and increasing but not guaranteed contiguous.

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use invoicer_core::SequenceScope;

use crate::error::{DbError, DbResult};

// =============================================================================
// Counter Store
// =============================================================================

/// Durable counter keyed by scope.
///
/// `increment` must be a single atomic read-modify-write: concurrent callers
/// for the same scope always receive distinct values, and the first call for
/// a scope returns 1.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Bumps the counter and returns the new value.
    async fn increment(&self, scope: SequenceScope) -> DbResult<u64>;

    /// Last value handed out, or 0.
    async fn current(&self, scope: SequenceScope) -> DbResult<u64>;
}

/// Process-local counter store.
///
/// Every increment happens inside one critical section.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    counters: Mutex<HashMap<SequenceScope, u64>>,
}

impl InMemoryCounterStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, scope: SequenceScope) -> DbResult<u64> {
        let mut counters = self.counters.lock().await;
        let seq = counters.entry(scope).or_insert(0);
        *seq += 1;
        Ok(*seq)
    }

    async fn current(&self, scope: SequenceScope) -> DbResult<u64> {
        Ok(self.counters.lock().await.get(&scope).copied().unwrap_or(0))
    }
}

// =============================================================================
// Policy
// =============================================================================

/// Retry and timeout settings for allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocatorPolicy {
    /// Deadline for the whole allocation, retries included.
    pub timeout: Duration,
    /// Attempts before giving up on transient errors. At least 1.
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for AllocatorPolicy {
    fn default() -> Self {
        AllocatorPolicy {
            timeout: Duration::from_secs(5),
            max_retries: 5,
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(500),
        }
    }
}

impl AllocatorPolicy {
    fn backoff(&self) -> ExponentialBackoff {
        let mut backoff = ExponentialBackoff {
            current_interval: self.initial_backoff,
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None, // the allocation deadline bounds total time
            ..Default::default()
        };
        // Default carries a 500ms current_interval; start from ours.
        backoff.reset();
        backoff
    }
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum AllocationError {
    /// The store rejected the increment or kept failing.
    #[error("Sequence allocation for {scope} failed after {attempts} attempt(s): {reason}")]
    AllocationFailed {
        scope: SequenceScope,
        attempts: u32,
        reason: String,
    },

    /// The deadline passed before the store answered.
    #[error("Sequence allocation for {scope} timed out after {timeout:?}")]
    Timeout {
        scope: SequenceScope,
        timeout: Duration,
    },
}

// =============================================================================
// Allocator
// =============================================================================

/// Allocates sequence numbers through a [`CounterStore`].
///
/// ## Example
/// ```rust,ignore
/// let allocator = SequenceAllocator::new(
///     Arc::new(InMemoryCounterStore::new()),
///     AllocatorPolicy::default(),
/// );
/// let scope = SequenceScope::new(2024, 5)?;
/// assert_eq!(allocator.allocate(scope).await?, 1);
/// assert_eq!(allocator.allocate(scope).await?, 2);
/// ```
#[derive(Clone)]
pub struct SequenceAllocator {
    store: Arc<dyn CounterStore>,
    policy: AllocatorPolicy,
}

impl std::fmt::Debug for SequenceAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SequenceAllocator")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl SequenceAllocator {
    pub fn new(store: Arc<dyn CounterStore>, policy: AllocatorPolicy) -> Self {
        SequenceAllocator { store, policy }
    }

    pub fn policy(&self) -> &AllocatorPolicy {
        &self.policy
    }

    /// Next sequence number for `scope`.
    ///
    /// ## Errors
    /// - `AllocationFailed` on a non-transient store error, or after
    ///   `max_retries` transient ones
    /// - `Timeout` if the whole operation exceeds `policy.timeout`
    pub async fn allocate(&self, scope: SequenceScope) -> Result<u64, AllocationError> {
        match tokio::time::timeout(self.policy.timeout, self.allocate_with_retries(scope)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%scope, timeout = ?self.policy.timeout, "Sequence allocation timed out");
                Err(AllocationError::Timeout {
                    scope,
                    timeout: self.policy.timeout,
                })
            }
        }
    }

    /// Last number handed out for `scope`, or 0.
    pub async fn current(&self, scope: SequenceScope) -> Result<u64, AllocationError> {
        self.store
            .current(scope)
            .await
            .map_err(|e| AllocationError::AllocationFailed {
                scope,
                attempts: 1,
                reason: e.to_string(),
            })
    }

    async fn allocate_with_retries(&self, scope: SequenceScope) -> Result<u64, AllocationError> {
        let max_attempts = self.policy.max_retries.max(1);
        let mut backoff = self.policy.backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.store.increment(scope).await {
                Ok(seq) => {
                    debug!(%scope, seq, attempt, "Sequence allocated");
                    return Ok(seq);
                }
                Err(e) if e.is_transient() && attempt < max_attempts => {
                    let wait = backoff.next_backoff().unwrap_or(self.policy.max_backoff);
                    debug!(%scope, attempt, ?wait, error = %e, "Transient allocation failure, retrying");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    warn!(%scope, attempt, error = %e, "Sequence allocation failed");
                    return Err(failed(scope, attempt, e));
                }
            }
        }
    }
}

fn failed(scope: SequenceScope, attempts: u32, err: DbError) -> AllocationError {
    AllocationError::AllocationFailed {
        scope,
        attempts,
        reason: err.to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn scope() -> SequenceScope {
        SequenceScope::new(2024, 5).unwrap()
    }

    fn fast_policy() -> AllocatorPolicy {
        AllocatorPolicy {
            timeout: Duration::from_secs(2),
            max_retries: 3,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(5),
        }
    }

    /// Fails with a given error for the first `failures` calls.
    struct FlakyStore {
        inner: InMemoryCounterStore,
        failures: u32,
        calls: AtomicU32,
        transient: bool,
    }

    impl FlakyStore {
        fn new(failures: u32, transient: bool) -> Self {
            FlakyStore {
                inner: InMemoryCounterStore::new(),
                failures,
                calls: AtomicU32::new(0),
                transient,
            }
        }
    }

    #[async_trait]
    impl CounterStore for FlakyStore {
        async fn increment(&self, scope: SequenceScope) -> DbResult<u64> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(if self.transient {
                    DbError::Busy("database is locked".into())
                } else {
                    DbError::ConnectionFailed("unreachable".into())
                });
            }
            self.inner.increment(scope).await
        }

        async fn current(&self, scope: SequenceScope) -> DbResult<u64> {
            self.inner.current(scope).await
        }
    }

    struct HangingStore;

    #[async_trait]
    impl CounterStore for HangingStore {
        async fn increment(&self, _scope: SequenceScope) -> DbResult<u64> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(1)
        }

        async fn current(&self, _scope: SequenceScope) -> DbResult<u64> {
            Ok(0)
        }
    }

    #[tokio::test]
    async fn test_first_allocation_is_one() {
        let allocator =
            SequenceAllocator::new(Arc::new(InMemoryCounterStore::new()), fast_policy());
        assert_eq!(allocator.current(scope()).await.unwrap(), 0);
        assert_eq!(allocator.allocate(scope()).await.unwrap(), 1);
        assert_eq!(allocator.allocate(scope()).await.unwrap(), 2);
        assert_eq!(allocator.current(scope()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried() {
        let store = Arc::new(FlakyStore::new(2, true));
        let allocator = SequenceAllocator::new(store.clone(), fast_policy());

        assert_eq!(allocator.allocate(scope()).await.unwrap(), 1);
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_first_retry_waits_initial_backoff() {
        let store = Arc::new(FlakyStore::new(1, true));
        let allocator = SequenceAllocator::new(store.clone(), fast_policy());

        let start = std::time::Instant::now();
        assert_eq!(allocator.allocate(scope()).await.unwrap(), 1);
        assert!(
            start.elapsed() < Duration::from_millis(150),
            "retry took {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_single_busy_retried_within_short_timeout() {
        let policy = AllocatorPolicy {
            timeout: Duration::from_millis(200),
            max_retries: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(20),
        };
        let store = Arc::new(FlakyStore::new(1, true));
        let allocator = SequenceAllocator::new(store.clone(), policy);

        assert_eq!(allocator.allocate(scope()).await.unwrap(), 1);
        assert_eq!(store.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_respects_policy_bounds() {
        let policy = fast_policy();
        let mut backoff = policy.backoff();
        for _ in 0..10 {
            let wait = backoff.next_backoff().unwrap();
            // randomization_factor 0.5 can stretch a wait by half
            assert!(wait <= policy.max_backoff * 3 / 2, "wait {wait:?}");
        }
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let store = Arc::new(FlakyStore::new(10, true));
        let allocator = SequenceAllocator::new(store.clone(), fast_policy());

        match allocator.allocate(scope()).await {
            Err(AllocationError::AllocationFailed { attempts, .. }) => assert_eq!(attempts, 3),
            other => panic!("expected AllocationFailed, got {other:?}"),
        }
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let store = Arc::new(FlakyStore::new(1, false));
        let allocator = SequenceAllocator::new(store.clone(), fast_policy());

        assert!(matches!(
            allocator.allocate(scope()).await,
            Err(AllocationError::AllocationFailed { attempts: 1, .. })
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout() {
        let policy = AllocatorPolicy {
            timeout: Duration::from_millis(20),
            ..fast_policy()
        };
        let allocator = SequenceAllocator::new(Arc::new(HangingStore), policy);

        assert!(matches!(
            allocator.allocate(scope()).await,
            Err(AllocationError::Timeout { .. })
        ));
    }

    async fn allocate_concurrently(allocator: SequenceAllocator, n: usize) -> Vec<u64> {
        let handles: Vec<_> = (0..n)
            .map(|_| {
                let allocator = allocator.clone();
                tokio::spawn(async move { allocator.allocate(scope()).await.unwrap() })
            })
            .collect();

        let mut values = Vec::with_capacity(n);
        for handle in handles {
            values.push(handle.await.unwrap());
        }
        values.sort_unstable();
        values
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_in_memory_allocations_are_distinct() {
        let allocator =
            SequenceAllocator::new(Arc::new(InMemoryCounterStore::new()), fast_policy());

        let values = allocate_concurrently(allocator, 200).await;
        assert_eq!(values, (1..=200).collect::<Vec<u64>>());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sqlite_allocations_are_distinct() {
        let path = std::env::temp_dir().join(format!("invoicer-alloc-{}.db", uuid::Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();
        let policy = AllocatorPolicy {
            timeout: Duration::from_secs(30),
            max_retries: 20,
            ..fast_policy()
        };
        let allocator = SequenceAllocator::new(Arc::new(db.counters()), policy);

        let values = allocate_concurrently(allocator, 50).await;
        let distinct: HashSet<u64> = values.iter().copied().collect();
        assert_eq!(distinct.len(), 50);
        assert_eq!(values, (1..=50).collect::<Vec<u64>>());
        assert_eq!(db.counters().current(scope()).await.unwrap(), 50);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
        }
    }
}
