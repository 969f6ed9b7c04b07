//! Transaction manager
//!
//! Runs units of work under optimistic concurrency with bounded retry.
//!
//! ## Attempt loop
//!
//! ```text
//! for attempt in 0..=max_retries:
//!     ctx = fresh TransactionContext
//!     match work(ctx):
//!         Ok(r)            -> return r
//!         Err(Conflict)    -> back off, next attempt
//!         Err(other)       -> return other (never retried)
//! return ConcurrencyExhausted { attempts: max_retries + 1 }
//! ```
//!
//! The unit of work may run up to `max_retries + 1` times, so it must be a
//! function of what it reads through the context, not of state captured
//! before the first attempt. Each write is atomic per record; a failed
//! attempt leaves behind only the writes it completed before the conflict.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use recmap_core::{Error, Result, StoreClient};
use recmap_mapper::EntityMapper;
use tracing::{debug, warn};

use crate::context::TransactionContext;
use crate::retry::RetryConfig;

/// Namespace used when none is configured
pub const DEFAULT_NAMESPACE: &str = "test";

/// Runs transactions against one store
pub struct TransactionManager {
    store: Arc<dyn StoreClient>,
    mapper: EntityMapper,
    default_namespace: String,
    retry: RetryConfig,
    next_txn_id: AtomicU64,
    stats: TransactionStats,
}

impl TransactionManager {
    /// Create a manager with the default namespace and retry configuration
    pub fn new(store: Arc<dyn StoreClient>, mapper: EntityMapper) -> Self {
        Self {
            store,
            mapper,
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            retry: RetryConfig::default(),
            next_txn_id: AtomicU64::new(1),
            stats: TransactionStats::default(),
        }
    }

    /// Use `config` for backoff and the default retry budget
    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Use `namespace` for types that don't pin one
    pub fn with_default_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.default_namespace = namespace.into();
        self
    }

    /// Retry configuration in use
    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Namespace used for types that don't pin one
    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Store the manager runs against
    pub fn store(&self) -> &Arc<dyn StoreClient> {
        &self.store
    }

    /// Mapper the manager converts objects with
    pub fn mapper(&self) -> &EntityMapper {
        &self.mapper
    }

    /// Run `work`, retrying on generation conflicts
    ///
    /// # Arguments
    /// * `max_retries` - Retries after the first attempt; `work` runs at most
    ///   `max_retries + 1` times
    /// * `work` - Unit of work, re-run from scratch on every attempt
    ///
    /// # Errors
    ///
    /// - `ConcurrencyExhausted` when every attempt ended in a conflict
    /// - any other error from `work` or the store, unretried
    pub fn transact<R, F>(&self, max_retries: usize, work: F) -> Result<R>
    where
        F: Fn(&mut TransactionContext<'_>) -> Result<R>,
    {
        let txn_id = self.next_txn_id.fetch_add(1, Ordering::Relaxed);
        let mut last_conflict = None;

        for attempt in 0..=max_retries {
            self.stats.attempts.fetch_add(1, Ordering::Relaxed);
            debug!(target: "recmap::txn", txn_id, attempt, "Transaction attempt started");

            let mut ctx = TransactionContext::new(
                txn_id,
                attempt,
                self.store.as_ref(),
                &self.mapper,
                &self.default_namespace,
            );

            match work(&mut ctx) {
                Ok(value) => {
                    self.stats.commits.fetch_add(1, Ordering::Relaxed);
                    debug!(target: "recmap::txn", txn_id, attempt, writes = ctx.write_count(), "Transaction completed");
                    return Ok(value);
                }
                Err(Error::Conflict {
                    key,
                    expected,
                    actual,
                }) => {
                    self.stats.conflicts.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        target: "recmap::txn",
                        txn_id,
                        attempt,
                        %key,
                        %expected,
                        %actual,
                        "Generation conflict"
                    );
                    last_conflict = Some(key);
                    if attempt < max_retries {
                        thread::sleep(self.retry.calculate_delay(attempt));
                    }
                }
                Err(e) => {
                    self.stats.failures.fetch_add(1, Ordering::Relaxed);
                    debug!(target: "recmap::txn", txn_id, attempt, error = %e, "Transaction failed");
                    return Err(e);
                }
            }
        }

        let attempts = max_retries.saturating_add(1);
        self.stats.exhausted.fetch_add(1, Ordering::Relaxed);
        warn!(target: "recmap::txn", txn_id, attempts, "Retries exhausted");
        Err(Error::ConcurrencyExhausted {
            attempts,
            key: last_conflict,
        })
    }

    /// Run `work` with the configured retry budget
    ///
    /// # Errors
    ///
    /// Same as `transact`.
    pub fn transact_default<R, F>(&self, work: F) -> Result<R>
    where
        F: Fn(&mut TransactionContext<'_>) -> Result<R>,
    {
        self.transact(self.retry.max_retries, work)
    }

    /// Snapshot of the transaction counters
    pub fn metrics(&self) -> TransactionMetrics {
        self.stats.snapshot()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("default_namespace", &self.default_namespace)
            .field("retry", &self.retry)
            .field("metrics", &self.metrics())
            .finish()
    }
}

// =============================================================================
// Statistics
// =============================================================================

/// Transaction counters
///
/// Counters use Relaxed ordering; they are observational and synchronize
/// nothing else.
#[derive(Debug, Default)]
pub struct TransactionStats {
    attempts: AtomicU64,
    commits: AtomicU64,
    conflicts: AtomicU64,
    failures: AtomicU64,
    exhausted: AtomicU64,
}

impl TransactionStats {
    /// Current values
    pub fn snapshot(&self) -> TransactionMetrics {
        TransactionMetrics {
            attempts: self.attempts.load(Ordering::Relaxed),
            commits: self.commits.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time transaction statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionMetrics {
    /// Unit-of-work invocations
    pub attempts: u64,
    /// Transactions that completed
    pub commits: u64,
    /// Attempts that ended in a generation conflict
    pub conflicts: u64,
    /// Transactions that failed with a non-conflict error
    pub failures: u64,
    /// Transactions that ran out of retries
    pub exhausted: u64,
}

impl TransactionMetrics {
    /// Transactions that finished, successfully or not
    pub fn total_completed(&self) -> u64 {
        self.commits + self.failures + self.exhausted
    }

    /// Conflicts per attempt
    pub fn conflict_rate(&self) -> f64 {
        if self.attempts > 0 {
            self.conflicts as f64 / self.attempts as f64
        } else {
            0.0
        }
    }
}
