//! Service layer: the coordinator, the dispatcher and the host that wires
//! them around one correlation table.

pub mod coordinator;
pub mod dispatcher;

pub use coordinator::ExchangeCoordinator;
pub use dispatcher::{DispatchOutcome, InboundDispatcher};

use crate::domain::config::{ConfigError, ExchangeConfig};
use crate::ports::outbound::Transport;
use as4_codec::WireCodec;
use as4_correlation::{sweep_task, CorrelationTable, SweepReport};
use as4_telemetry::{PENDING_CORRELATIONS, SWEEP_REMOVALS};
use parking_lot::Mutex;
use shared_types::Notification;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("No tokio runtime to spawn the sweeper on: {0}")]
    NoRuntime(String),
}

/// Owns the correlation table and everything that shares it.
///
/// Construct one per hosting application. Hand [`ExchangeService::dispatcher`]
/// to whatever receives inbound traffic and call
/// [`ExchangeService::coordinator`] to send.
pub struct ExchangeService {
    config: ExchangeConfig,
    table: Arc<CorrelationTable<Notification>>,
    coordinator: ExchangeCoordinator,
    dispatcher: Arc<InboundDispatcher>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl ExchangeService {
    pub fn new(config: ExchangeConfig, transport: Arc<dyn Transport>) -> Result<Self, ConfigError> {
        config.validate()?;

        let codec = Arc::new(WireCodec::new(config.codec_config()));
        let table = Arc::new(CorrelationTable::new(config.sweep.policy()));
        let coordinator = ExchangeCoordinator::new(
            Arc::clone(&codec),
            Arc::clone(&table),
            transport,
            config.timeouts.wait(),
        );
        let dispatcher = Arc::new(InboundDispatcher::new(codec, Arc::clone(&table)));

        info!(
            local_party = %config.local_party.party_id,
            gateway_party = %config.gateway_party.party_id,
            wait_ms = config.timeouts.wait_ms,
            "Exchange service created"
        );

        Ok(Self {
            config,
            table,
            coordinator,
            dispatcher,
            sweeper: Mutex::new(None),
        })
    }

    /// Spawn the periodic sweeper on the current tokio runtime.
    ///
    /// Does nothing if it is already running.
    pub fn start(&self) -> Result<(), ServiceError> {
        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| ServiceError::NoRuntime(e.to_string()))?;

        let table = Arc::clone(&self.table);
        let observed = Arc::clone(&self.table);
        let period = self.config.sweep.period();
        *sweeper = Some(runtime.spawn(sweep_task(table, period, move |report: &SweepReport| {
            SWEEP_REMOVALS
                .with_label_values(&["fulfilled"])
                .inc_by(report.fulfilled as f64);
            SWEEP_REMOVALS
                .with_label_values(&["abandoned"])
                .inc_by(report.abandoned as f64);
            PENDING_CORRELATIONS.set(observed.len() as f64);
        })));

        info!(period_ms = self.config.sweep.period_ms, "Correlation sweeper started");
        Ok(())
    }

    /// Stop the sweeper. Pending exchanges are unaffected.
    pub fn shutdown(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            info!("Correlation sweeper stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    pub fn coordinator(&self) -> &ExchangeCoordinator {
        &self.coordinator
    }

    pub fn dispatcher(&self) -> Arc<InboundDispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn table(&self) -> Arc<CorrelationTable<Notification>> {
        Arc::clone(&self.table)
    }

    pub fn config(&self) -> &ExchangeConfig {
        &self.config
    }
}

impl Drop for ExchangeService {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}
