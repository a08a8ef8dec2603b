//! Exchange Coordinator - one outbound exchange end to end.
//!
//! Flow:
//! 1. Validate routing (no network activity on failure)
//! 2. Encode the message, producing a fresh message id `M1`
//! 3. Transmit; an immediate fault ends the exchange
//! 4. Wait for the submission acknowledgement keyed by `M1`
//! 5. Wait for the relay acknowledgement keyed by the id `M2` carried in
//!    the submission acknowledgement
//!
//! Each wait is bounded by the per-call timeout, so a call can block for up
//! to twice that timeout.

use crate::domain::error::{outcomes, ExchangeError};
use crate::domain::state::{ExchangeProgress, ExchangeReceipt, ExchangeState};
use crate::ports::outbound::Transport;
use as4_codec::constants::EBMS_MISSING_RECEIPT;
use as4_codec::WireCodec;
use as4_correlation::{CorrelationError, CorrelationTable};
use as4_telemetry::{time_histogram, EXCHANGES_STARTED, EXCHANGE_DURATION, EXCHANGE_OUTCOMES};
use shared_types::{
    BusinessMessage, ErrorDetail, Notification, NotificationKind, RoutingInformation,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

pub struct ExchangeCoordinator {
    codec: Arc<WireCodec>,
    table: Arc<CorrelationTable<Notification>>,
    transport: Arc<dyn Transport>,
    default_timeout: Duration,
}

impl ExchangeCoordinator {
    pub fn new(
        codec: Arc<WireCodec>,
        table: Arc<CorrelationTable<Notification>>,
        transport: Arc<dyn Transport>,
        default_timeout: Duration,
    ) -> Self {
        Self {
            codec,
            table,
            transport,
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Send `message` and wait for both acknowledgements.
    ///
    /// `timeout` bounds each of the two waits; `None` uses the configured
    /// default and a zero duration waits indefinitely.
    pub async fn send(
        &self,
        routing: &RoutingInformation,
        message: &BusinessMessage,
        timeout: Option<Duration>,
    ) -> Result<ExchangeReceipt, ExchangeError> {
        EXCHANGES_STARTED.inc();
        let _timer = time_histogram!(EXCHANGE_DURATION);

        let result = self
            .exchange(routing, message, timeout.unwrap_or(self.default_timeout))
            .await;

        let outcome = match &result {
            Ok(_) => outcomes::SUCCESS,
            Err(e) => e.outcome_label(),
        };
        EXCHANGE_OUTCOMES.with_label_values(&[outcome]).inc();

        if let Err(e) = &result {
            warn!(
                receiver = %message.receiver(),
                outcome = outcome,
                error = %e,
                "Exchange failed"
            );
        }
        result
    }

    async fn exchange(
        &self,
        routing: &RoutingInformation,
        message: &BusinessMessage,
        timeout: Duration,
    ) -> Result<ExchangeReceipt, ExchangeError> {
        let started = Instant::now();
        let mut progress = ExchangeProgress::new();

        let target = routing.validate()?;

        let encoded = self.codec.encode_outbound(routing, message)?;
        let message_id = encoded.message_id().to_string();
        progress.set_message_id(&message_id);
        progress.advance(ExchangeState::Encoded);

        let fault = self
            .transport
            .transmit(
                &encoded.envelope,
                &encoded.attachments,
                target.endpoint_url,
                target.certificate,
            )
            .await
            .map_err(|source| ExchangeError::Transport {
                message_id: message_id.clone(),
                source,
            })?;
        if let Some(fault) = fault {
            return Err(ExchangeError::TransportRejected {
                message_id,
                detail: ErrorDetail::from(&fault),
            });
        }
        progress.advance(ExchangeState::Transmitted);

        // First hop: the local gateway's verdict on M1.
        progress.advance(ExchangeState::AwaitingSubmission);
        let submission = self
            .await_notification(NotificationKind::Submission, &message_id, timeout)
            .await?;
        if !submission.is_acknowledged() {
            progress.advance(ExchangeState::SubmissionRejected);
            return Err(ExchangeError::SubmissionFailed {
                message_id,
                detail: submission.error.unwrap_or_default(),
            });
        }
        progress.advance(ExchangeState::SubmissionAccepted);

        // Second hop is keyed by the id the submission acknowledgement introduced.
        let relay_message_id = submission
            .message_id
            .ok_or_else(|| ExchangeError::MalformedAcknowledgement {
                message_id: message_id.clone(),
            })?;

        progress.advance(ExchangeState::AwaitingRelay);
        let relay = self
            .await_notification(NotificationKind::Relay, &relay_message_id, timeout)
            .await?;
        if !relay.is_acknowledged() {
            progress.advance(ExchangeState::RelayRejected);
            let detail = relay.error.unwrap_or_default();
            return Err(if detail.code == EBMS_MISSING_RECEIPT {
                ExchangeError::RelaySpecificFailure {
                    message_id,
                    relay_message_id,
                    detail,
                }
            } else {
                ExchangeError::RelayGenericFailure {
                    message_id,
                    relay_message_id,
                    detail,
                }
            });
        }
        progress.advance(ExchangeState::RelayAccepted);

        let receipt = ExchangeReceipt {
            message_id,
            relay_message_id,
            conversation_id: encoded.conversation_id().to_string(),
            elapsed: started.elapsed(),
        };

        info!(
            message_id = %receipt.message_id,
            relay_message_id = %receipt.relay_message_id,
            receiver = %message.receiver(),
            state = %progress.state(),
            elapsed_ms = receipt.elapsed.as_millis() as u64,
            "Exchange completed"
        );

        Ok(receipt)
    }

    async fn await_notification(
        &self,
        hop: NotificationKind,
        key: &str,
        timeout: Duration,
    ) -> Result<Notification, ExchangeError> {
        let notification = self
            .table
            .obtain(key, timeout)
            .await
            .map_err(|e| match e {
                CorrelationError::Timeout { key, waited } => {
                    ExchangeError::CorrelationTimeout { hop, key, waited }
                }
            })?;
        if notification.kind != hop {
            return Err(ExchangeError::UnexpectedAcknowledgement {
                key: key.to_string(),
                expected: hop,
                received: notification.kind,
            });
        }
        Ok(notification)
    }
}
