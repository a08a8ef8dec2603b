//! Correlation Table - asynchronous fulfilment to synchronous waiting.
//!
//! Maps correlation keys (message ids) to waiter cells. A cell holds at most
//! one fulfilled value and wakes every task waiting on it.
//!
//! ## Locking
//!
//! All structural changes (create, fulfil, claim, remove, sweep) happen under
//! one table-level lock. Waiting happens outside it, on the cell's own
//! [`Notify`], so a slow key never blocks unrelated keys. Lock order is
//! always table, then cell slot.
//!
//! ## Mailbox semantics
//!
//! A value fulfilled before anyone waits stays in its cell until a later
//! [`CorrelationTable::obtain`] claims it or the sweep expires it.

use crate::error::CorrelationError;
use crate::sweep::{SweepPolicy, SweepReport};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Notify;
use tracing::{debug, warn};

struct Fulfilment<T> {
    value: T,
    fulfilled_at: Instant,
}

struct WaiterCell<T> {
    slot: Mutex<Option<Fulfilment<T>>>,
    notify: Notify,
    created_at: Instant,
    /// Tasks currently inside `obtain` for this cell. Only changed under the
    /// table lock.
    waiters: AtomicUsize,
}

impl<T> WaiterCell<T> {
    fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            notify: Notify::new(),
            created_at: Instant::now(),
            waiters: AtomicUsize::new(0),
        }
    }
}

/// Counters for table activity.
#[derive(Debug, Default)]
pub struct CorrelationStats {
    /// Values claimed without waiting (fulfilled before `obtain`)
    pub obtained_immediately: AtomicU64,
    /// Values claimed after waiting
    pub obtained_after_wait: AtomicU64,
    /// Fulfilments received
    pub fulfilled: AtomicU64,
    /// Fulfilments that overwrote an unclaimed value
    pub replaced: AtomicU64,
    /// Waits that ended in timeout
    pub timeouts: AtomicU64,
    /// Fulfilled-but-unclaimed cells removed by the sweep
    pub swept_fulfilled: AtomicU64,
    /// Empty cells removed by the abandoned-cell sweep
    pub swept_abandoned: AtomicU64,
}

/// Concurrent waiting room keyed by correlation id.
pub struct CorrelationTable<T> {
    cells: Mutex<HashMap<String, Arc<WaiterCell<T>>>>,
    policy: SweepPolicy,
    stats: CorrelationStats,
}

impl<T: Send> CorrelationTable<T> {
    pub fn new(policy: SweepPolicy) -> Self {
        Self {
            cells: Mutex::new(HashMap::new()),
            policy,
            stats: CorrelationStats::default(),
        }
    }

    /// Wait for the value fulfilled under `key`.
    ///
    /// Returns at once if the value is already there. Otherwise waits until
    /// it is fulfilled or `timeout` elapses; a zero timeout waits forever.
    /// Concurrent calls for one key share a cell and the first to wake
    /// claims the value.
    pub async fn obtain(&self, key: &str, timeout: Duration) -> Result<T, CorrelationError> {
        let started = Instant::now();

        let cell = {
            let mut cells = self.cells.lock();
            let ready = cells.get(key).and_then(|cell| {
                let fulfilment = cell.slot.lock().take()?;
                Some((fulfilment, cell.waiters.load(Ordering::Acquire)))
            });
            if let Some((fulfilment, waiters)) = ready {
                if waiters == 0 {
                    cells.remove(key);
                }
                self.stats.obtained_immediately.fetch_add(1, Ordering::Relaxed);
                debug!(key = %key, "Claimed waiting notification");
                return Ok(fulfilment.value);
            }

            let cell = Arc::clone(
                cells
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(WaiterCell::new())),
            );
            cell.waiters.fetch_add(1, Ordering::AcqRel);
            cell
        };

        let _guard = WaiterGuard {
            table: self,
            cell: Arc::clone(&cell),
        };

        let wait = self.wait_for(key, &cell);
        let outcome = if timeout.is_zero() {
            Ok(wait.await)
        } else {
            tokio::time::timeout(timeout, wait).await
        };

        match outcome {
            Ok(value) => {
                self.stats.obtained_after_wait.fetch_add(1, Ordering::Relaxed);
                debug!(
                    key = %key,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Notification received"
                );
                Ok(value)
            }
            Err(_) => {
                let waited = started.elapsed();
                self.stats.timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    key = %key,
                    timeout_ms = timeout.as_millis() as u64,
                    "Timed out waiting for notification"
                );
                Err(CorrelationError::Timeout {
                    key: key.to_string(),
                    waited,
                })
            }
        }
    }

    async fn wait_for(&self, key: &str, cell: &Arc<WaiterCell<T>>) -> T {
        loop {
            // Register interest before checking the slot so a fulfilment
            // between the check and the await is not missed.
            let notified = cell.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.claim(key, cell) {
                return value;
            }
            notified.await;
        }
    }

    fn claim(&self, key: &str, cell: &Arc<WaiterCell<T>>) -> Option<T> {
        let mut cells = self.cells.lock();
        let fulfilment = cell.slot.lock().take()?;

        // Joined waiters keep the cell so a later fulfilment still reaches them.
        let last_waiter = cell.waiters.load(Ordering::Acquire) <= 1;
        if last_waiter && cells.get(key).is_some_and(|c| Arc::ptr_eq(c, cell)) {
            cells.remove(key);
        }
        Some(fulfilment.value)
    }

    /// Store `value` under `key` and wake every task waiting on it.
    ///
    /// A value with no waiter yet is kept for a later `obtain`. Returns
    /// `true` if a waiter was already present.
    pub fn fulfil(&self, key: &str, value: T) -> bool {
        let (cell, replaced, waiting) = {
            let mut cells = self.cells.lock();
            let cell = Arc::clone(
                cells
                    .entry(key.to_string())
                    .or_insert_with(|| Arc::new(WaiterCell::new())),
            );
            let replaced = cell
                .slot
                .lock()
                .replace(Fulfilment {
                    value,
                    fulfilled_at: Instant::now(),
                })
                .is_some();
            let waiting = cell.waiters.load(Ordering::Acquire) > 0;
            (cell, replaced, waiting)
        };

        self.stats.fulfilled.fetch_add(1, Ordering::Relaxed);
        if replaced {
            self.stats.replaced.fetch_add(1, Ordering::Relaxed);
            warn!(key = %key, "Replacing unclaimed notification");
        }
        debug!(key = %key, waiting, "Fulfilled correlation key");

        cell.notify.notify_waiters();
        waiting
    }

    /// Remove stale cells as of `now`.
    ///
    /// Fulfilled cells older than the expiry window are always removed.
    /// Empty cells are removed only when the policy enables it and no task
    /// is waiting on them.
    pub fn sweep(&self, now: Instant) -> SweepReport {
        let mut report = SweepReport::default();
        let mut cells = self.cells.lock();

        cells.retain(|key, cell| {
            let slot = cell.slot.lock();
            match slot.as_ref() {
                Some(fulfilment) => {
                    let age = now.saturating_duration_since(fulfilment.fulfilled_at);
                    if age > self.policy.expiry {
                        debug!(
                            key = %key,
                            age_ms = age.as_millis() as u64,
                            "Sweeping unclaimed notification"
                        );
                        report.fulfilled += 1;
                        return false;
                    }
                    true
                }
                None => {
                    let Some(window) = self.policy.abandoned_expiry else {
                        return true;
                    };
                    let age = now.saturating_duration_since(cell.created_at);
                    if age > window && cell.waiters.load(Ordering::Acquire) == 0 {
                        debug!(
                            key = %key,
                            age_ms = age.as_millis() as u64,
                            "Sweeping abandoned cell"
                        );
                        report.abandoned += 1;
                        return false;
                    }
                    true
                }
            }
        });
        drop(cells);

        self.stats
            .swept_fulfilled
            .fetch_add(report.fulfilled as u64, Ordering::Relaxed);
        self.stats
            .swept_abandoned
            .fetch_add(report.abandoned as u64, Ordering::Relaxed);
        report
    }

    /// Number of live cells.
    pub fn len(&self) -> usize {
        self.cells.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.lock().is_empty()
    }

    /// Whether a cell exists for `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.cells.lock().contains_key(key)
    }

    pub fn policy(&self) -> &SweepPolicy {
        &self.policy
    }

    pub fn stats(&self) -> &CorrelationStats {
        &self.stats
    }
}

impl<T: Send> Default for CorrelationTable<T> {
    fn default() -> Self {
        Self::new(SweepPolicy::default())
    }
}

/// Unregisters a waiter when `obtain` returns or is dropped.
struct WaiterGuard<'a, T> {
    table: &'a CorrelationTable<T>,
    cell: Arc<WaiterCell<T>>,
}

impl<T> Drop for WaiterGuard<'_, T> {
    fn drop(&mut self) {
        let _cells = self.table.cells.lock();
        self.cell.waiters.fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    fn table() -> Arc<CorrelationTable<&'static str>> {
        Arc::new(CorrelationTable::default())
    }

    #[tokio::test]
    async fn test_fulfil_before_obtain() {
        let table = table();
        assert!(!table.fulfil("m1", "ack"));
        assert!(table.contains("m1"));

        let value = table.obtain("m1", Duration::from_millis(10)).await.unwrap();
        assert_eq!(value, "ack");
        assert!(table.is_empty());
        assert_eq!(table.stats().obtained_immediately.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_returns_stored_value() {
        let table = table();
        table.fulfil("m1", "ack");
        assert_eq!(table.obtain("m1", Duration::ZERO).await.unwrap(), "ack");
    }

    #[tokio::test]
    async fn test_zero_timeout_waits_until_fulfilled() {
        let table = table();
        let waiter = {
            let table = Arc::clone(&table);
            tokio::spawn(async move { table.obtain("m1", Duration::ZERO).await })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!waiter.is_finished());

        table.fulfil("m1", "late");
        assert_eq!(waiter.await.unwrap().unwrap(), "late");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_obtain_then_fulfil() {
        let table = table();
        let waiter = {
            let table = Arc::clone(&table);
            tokio::spawn(async move { table.obtain("m1", Duration::from_secs(5)).await })
        };

        while !table.contains("m1") {
            tokio::task::yield_now().await;
        }
        table.fulfil("m1", "ack");

        assert_eq!(waiter.await.unwrap().unwrap(), "ack");
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_timeout_is_not_early() {
        let table = table();
        let started = Instant::now();

        let err = table.obtain("never", Duration::from_millis(50)).await.unwrap_err();

        assert!(started.elapsed() >= Duration::from_millis(50));
        assert_eq!(err.key(), "never");
        assert_eq!(table.stats().timeouts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_late_fulfilment_is_harmless() {
        let table = table();
        assert!(table.obtain("m1", Duration::from_millis(10)).await.is_err());

        // The abandoned cell stays until fulfilled, then the sweep can expire it.
        assert!(table.contains("m1"));
        assert!(!table.fulfil("m1", "late"));

        let report = table.sweep(Instant::now() + Duration::from_secs(301));
        assert_eq!(report.fulfilled, 1);
        assert!(table.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_independent_keys() {
        let table: Arc<CorrelationTable<usize>> = Arc::new(CorrelationTable::default());

        let waiters: Vec<_> = (0..64)
            .map(|i| {
                let table = Arc::clone(&table);
                tokio::spawn(async move {
                    table
                        .obtain(&format!("key-{i}"), Duration::from_secs(5))
                        .await
                })
            })
            .collect();

        for i in (0..64).rev() {
            table.fulfil(&format!("key-{i}"), i);
        }

        for (i, waiter) in waiters.into_iter().enumerate() {
            assert_eq!(waiter.await.unwrap().unwrap(), i);
        }
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn test_joined_waiters_share_cell() {
        let table = table();
        let first = {
            let table = Arc::clone(&table);
            tokio::spawn(async move { table.obtain("m1", Duration::from_millis(500)).await })
        };
        let second = {
            let table = Arc::clone(&table);
            tokio::spawn(async move { table.obtain("m1", Duration::from_millis(500)).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(table.len(), 1);

        table.fulfil("m1", "one");
        tokio::time::sleep(Duration::from_millis(20)).await;
        table.fulfil("m1", "two");

        let mut values = vec![
            first.await.unwrap().unwrap(),
            second.await.unwrap().unwrap(),
        ];
        values.sort_unstable();
        assert_eq!(values, vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_duplicate_fulfil_replaces() {
        let table = table();
        table.fulfil("m1", "first");
        table.fulfil("m1", "second");

        assert_eq!(table.obtain("m1", Duration::ZERO).await.unwrap(), "second");
        assert_eq!(table.stats().replaced.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_sweep_keeps_fresh_and_empty_cells() {
        let table: CorrelationTable<&str> = CorrelationTable::default();
        table.fulfil("fresh", "ack");

        let report = table.sweep(Instant::now());
        assert_eq!(report, SweepReport::default());
        assert!(table.contains("fresh"));
    }

    #[tokio::test]
    async fn test_empty_cells_survive_default_sweep() {
        let table = table();
        let _ = table.obtain("abandoned", Duration::from_millis(1)).await;

        let report = table.sweep(Instant::now() + Duration::from_secs(3600));
        assert_eq!(report.abandoned, 0);
        assert!(table.contains("abandoned"));
    }

    #[tokio::test]
    async fn test_abandoned_sweep_skips_active_waiters() {
        let table: Arc<CorrelationTable<&str>> = Arc::new(CorrelationTable::new(SweepPolicy {
            expiry: Duration::from_secs(300),
            abandoned_expiry: Some(Duration::from_secs(60)),
        }));

        let _ = table.obtain("abandoned", Duration::from_millis(1)).await;
        let waiter = {
            let table = Arc::clone(&table);
            tokio::spawn(async move { table.obtain("active", Duration::ZERO).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        let report = table.sweep(Instant::now() + Duration::from_secs(120));
        assert_eq!(report.abandoned, 1);
        assert!(!table.contains("abandoned"));
        assert!(table.contains("active"));

        table.fulfil("active", "ack");
        assert_eq!(waiter.await.unwrap().unwrap(), "ack");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sweep_runs_alongside_traffic() {
        let table: Arc<CorrelationTable<usize>> = Arc::new(CorrelationTable::new(SweepPolicy {
            expiry: Duration::from_secs(300),
            abandoned_expiry: Some(Duration::ZERO),
        }));
        let running = Arc::new(AtomicBool::new(true));

        let sweeper = {
            let table = Arc::clone(&table);
            let running = Arc::clone(&running);
            tokio::spawn(async move {
                let mut fulfilled = 0;
                while running.load(Ordering::Acquire) {
                    fulfilled += table.sweep(Instant::now()).fulfilled;
                    tokio::task::yield_now().await;
                }
                fulfilled
            })
        };

        let exchanges: Vec<_> = (0..256usize)
            .map(|i| {
                let table = Arc::clone(&table);
                tokio::spawn(async move {
                    let key = format!("key-{i}");
                    if i % 2 == 0 {
                        // Fulfilled first, claimed later.
                        table.fulfil(&key, i);
                        tokio::task::yield_now().await;
                        table.obtain(&key, Duration::from_secs(10)).await
                    } else {
                        let waiter = {
                            let table = Arc::clone(&table);
                            let key = key.clone();
                            tokio::spawn(async move {
                                table.obtain(&key, Duration::from_secs(10)).await
                            })
                        };
                        tokio::task::yield_now().await;
                        table.fulfil(&key, i);
                        waiter.await.unwrap()
                    }
                })
            })
            .collect();

        for (i, exchange) in exchanges.into_iter().enumerate() {
            assert_eq!(exchange.await.unwrap().unwrap(), i);
        }
        running.store(false, Ordering::Release);

        assert_eq!(sweeper.await.unwrap(), 0);
        assert_eq!(table.stats().swept_fulfilled.load(Ordering::Relaxed), 0);
        assert_eq!(table.stats().timeouts.load(Ordering::Relaxed), 0);
        assert!(table.is_empty());
    }
}
