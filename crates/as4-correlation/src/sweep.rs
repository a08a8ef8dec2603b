//! Expiry policy and the periodic sweep task.

use crate::table::CorrelationTable;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// Default age after which an unclaimed value is dropped.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(300);

/// Default interval between sweeps.
pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_secs(300);

/// What the sweep is allowed to remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepPolicy {
    /// Fulfilled cells older than this are removed.
    pub expiry: Duration,
    /// Empty cells older than this are removed when nobody waits on them.
    /// `None` keeps empty cells until fulfilled.
    pub abandoned_expiry: Option<Duration>,
}

impl Default for SweepPolicy {
    fn default() -> Self {
        Self {
            expiry: DEFAULT_EXPIRY,
            abandoned_expiry: None,
        }
    }
}

/// Cells removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub fulfilled: usize,
    pub abandoned: usize,
}

impl SweepReport {
    #[must_use]
    pub fn total(&self) -> usize {
        self.fulfilled + self.abandoned
    }
}

/// Background task sweeping `table` every `period`.
///
/// `on_sweep` sees every report, including empty ones. Runs until the task
/// is aborted.
pub async fn sweep_task<T, F>(table: Arc<CorrelationTable<T>>, period: Duration, on_sweep: F)
where
    T: Send,
    F: Fn(&SweepReport),
{
    let mut sweep_interval = tokio::time::interval(period);
    sweep_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first tick completes immediately.
    sweep_interval.tick().await;

    loop {
        sweep_interval.tick().await;
        let report = table.sweep(Instant::now());
        if report.total() > 0 {
            debug!(
                fulfilled = report.fulfilled,
                abandoned = report.abandoned,
                remaining = table.len(),
                "Swept correlation table"
            );
        }
        on_sweep(&report);
    }
}
