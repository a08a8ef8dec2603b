//! In-process gateway that answers transmissions with scripted
//! acknowledgements.
//!
//! Acknowledgements are encoded, framed as `multipart/related` and pushed
//! through a real [`InboundDispatcher`], so the full decode and fulfil path
//! runs exactly as it would for traffic from a network listener.

use crate::ports::outbound::{Transport, TransportError};
use crate::service::dispatcher::{DispatchOutcome, InboundDispatcher};
use as4_codec::{mime, WireCodec};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use shared_types::{
    Attachment, ErrorDetail, ErrorRecord, Notification, NotificationKind, WireEnvelope,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// How the gateway answers one hop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HopOutcome {
    Accept,
    Reject(ErrorDetail),
    /// Send nothing.
    Silent,
}

impl HopOutcome {
    pub fn reject(code: impl Into<String>) -> Self {
        Self::Reject(ErrorDetail::new(code))
    }
}

#[derive(Debug, Clone)]
pub struct GatewayScript {
    /// Fault returned synchronously from `transmit`; nothing else is sent.
    pub immediate_fault: Option<ErrorRecord>,
    pub submission: HopOutcome,
    pub relay: HopOutcome,
    /// Whether the submission acknowledgement carries the relay message id.
    pub chain_message_id: bool,
    /// Pause before each acknowledgement.
    pub delay: Duration,
}

impl Default for GatewayScript {
    fn default() -> Self {
        Self {
            immediate_fault: None,
            submission: HopOutcome::Accept,
            relay: HopOutcome::Accept,
            chain_message_id: true,
            delay: Duration::from_millis(5),
        }
    }
}

impl GatewayScript {
    /// Accept both hops.
    pub fn accept_all() -> Self {
        Self::default()
    }

    pub fn immediate_fault(record: ErrorRecord) -> Self {
        Self {
            immediate_fault: Some(record),
            ..Self::default()
        }
    }

    pub fn with_submission(mut self, outcome: HopOutcome) -> Self {
        self.submission = outcome;
        self
    }

    pub fn with_relay(mut self, outcome: HopOutcome) -> Self {
        self.relay = outcome;
        self
    }

    pub fn without_chained_id(mut self) -> Self {
        self.chain_message_id = false;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// One recorded call to `transmit`.
#[derive(Debug, Clone)]
pub struct Transmission {
    pub envelope: WireEnvelope,
    pub attachments: Vec<Attachment>,
    pub endpoint_url: String,
    pub certificate: Vec<u8>,
}

pub struct LoopbackGateway {
    codec: Arc<WireCodec>,
    script: Mutex<GatewayScript>,
    dispatcher: RwLock<Option<Arc<InboundDispatcher>>>,
    transmissions: Mutex<Vec<Transmission>>,
}

impl LoopbackGateway {
    pub fn new(script: GatewayScript) -> Self {
        Self {
            codec: Arc::new(WireCodec::default()),
            script: Mutex::new(script),
            dispatcher: RwLock::new(None),
            transmissions: Mutex::new(Vec::new()),
        }
    }

    /// Route acknowledgements to `dispatcher`. Until connected, every
    /// transmission fails as unreachable.
    pub fn connect(&self, dispatcher: Arc<InboundDispatcher>) {
        *self.dispatcher.write() = Some(dispatcher);
    }

    pub fn set_script(&self, script: GatewayScript) {
        *self.script.lock() = script;
    }

    pub fn transmissions(&self) -> Vec<Transmission> {
        self.transmissions.lock().clone()
    }

    pub fn transmission_count(&self) -> usize {
        self.transmissions.lock().len()
    }
}

#[async_trait]
impl Transport for LoopbackGateway {
    async fn transmit(
        &self,
        envelope: &WireEnvelope,
        attachments: &[Attachment],
        endpoint_url: &str,
        certificate: &[u8],
    ) -> Result<Option<ErrorRecord>, TransportError> {
        self.transmissions.lock().push(Transmission {
            envelope: envelope.clone(),
            attachments: attachments.to_vec(),
            endpoint_url: endpoint_url.to_string(),
            certificate: certificate.to_vec(),
        });

        let script = self.script.lock().clone();
        if let Some(mut fault) = script.immediate_fault {
            fault.ref_to_message_id = Some(envelope.message_id().to_string());
            return Ok(Some(fault));
        }

        let dispatcher = self
            .dispatcher
            .read()
            .clone()
            .ok_or_else(|| TransportError::Unreachable(endpoint_url.to_string()))?;

        let message_id = envelope.message_id().to_string();
        let relay_id = self.codec.next_message_id();
        tokio::spawn(answer(
            Arc::clone(&self.codec),
            dispatcher,
            script,
            message_id,
            relay_id,
        ));

        Ok(None)
    }
}

/// Play both hops of `script` for one transmission.
async fn answer(
    codec: Arc<WireCodec>,
    dispatcher: Arc<InboundDispatcher>,
    script: GatewayScript,
    message_id: String,
    relay_id: String,
) {
    tokio::time::sleep(script.delay).await;

    let chained = script.chain_message_id.then(|| relay_id.clone());
    let submission = match script.submission {
        HopOutcome::Accept => {
            Notification::acknowledged(NotificationKind::Submission, &message_id, chained)
        }
        HopOutcome::Reject(detail) => {
            Notification::error(NotificationKind::Submission, &message_id, chained, detail)
        }
        HopOutcome::Silent => return,
    };
    let accepted = submission.is_acknowledged();
    push(&codec, &dispatcher, &submission);
    if !accepted || !script.chain_message_id {
        return;
    }

    tokio::time::sleep(script.delay).await;

    let relay = match script.relay {
        HopOutcome::Accept => Notification::acknowledged(NotificationKind::Relay, &relay_id, None),
        HopOutcome::Reject(detail) => {
            Notification::error(NotificationKind::Relay, &relay_id, None, detail)
        }
        HopOutcome::Silent => return,
    };
    push(&codec, &dispatcher, &relay);
}

fn push(codec: &WireCodec, dispatcher: &InboundDispatcher, notification: &Notification) {
    let raw = match codec.to_wire(&codec.encode_acknowledgement(notification)) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(key = %notification.key, error = %e, "Cannot encode acknowledgement");
            return;
        }
    };
    let packaged = mime::package(&raw, &[]);
    let outcome = dispatcher.on_receive_mime(&packaged.content_type, &packaged.body);
    if let DispatchOutcome::Rejected { reason, .. } = &outcome {
        warn!(key = %notification.key, reason = %reason, "Acknowledgement rejected by dispatcher");
    } else {
        debug!(key = %notification.key, kind = %notification.kind, "Acknowledgement pushed");
    }
}
