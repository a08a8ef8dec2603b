//! Inbound Dispatcher - routes decoded traffic.
//!
//! Business messages go to every registered [`MessageHandler`] in
//! registration order. Acknowledgements become fulfilments of the
//! correlation table. Nothing raised here reaches the transport: decode
//! failures and handler failures are logged, counted and contained.

use crate::ports::inbound::MessageHandler;
use as4_codec::{mime, DecodedMessage, Inbound, WireCodec};
use as4_correlation::CorrelationTable;
use as4_telemetry::{
    DECODE_FAILURES, HANDLER_FAILURES, INBOUND_MESSAGES_DELIVERED, NOTIFICATIONS_FULFILLED,
};
use parking_lot::RwLock;
use shared_types::{Attachment, Notification, NotificationKind};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// What became of one inbound transmission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A business message was handed to `handlers` handlers, `failures` of
    /// which returned an error or panicked.
    Delivered {
        message_id: String,
        handlers: usize,
        failures: usize,
    },
    /// An acknowledgement was stored under `key`.
    Fulfilled {
        kind: NotificationKind,
        key: String,
        /// Whether a waiter was already blocked on the key.
        waiting: bool,
    },
    /// The transmission could not be decoded and was dropped.
    Rejected {
        reason: String,
        locator: Option<String>,
    },
}

pub struct InboundDispatcher {
    codec: Arc<WireCodec>,
    table: Arc<CorrelationTable<Notification>>,
    handlers: RwLock<Vec<Arc<dyn MessageHandler>>>,
}

impl InboundDispatcher {
    pub fn new(codec: Arc<WireCodec>, table: Arc<CorrelationTable<Notification>>) -> Self {
        Self {
            codec,
            table,
            handlers: RwLock::new(Vec::new()),
        }
    }

    /// Append a handler. Registering the same handler twice delivers every
    /// message to it twice.
    pub fn register(&self, handler: Arc<dyn MessageHandler>) {
        let mut handlers = self.handlers.write();
        handlers.push(handler);
        debug!(handlers = handlers.len(), "Registered message handler");
    }

    /// Remove the first registration of `handler` (compared by identity).
    pub fn deregister(&self, handler: &Arc<dyn MessageHandler>) -> bool {
        let mut handlers = self.handlers.write();
        match handlers.iter().position(|h| Arc::ptr_eq(h, handler)) {
            Some(index) => {
                handlers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().len()
    }

    /// Decode and route one transmission.
    pub fn on_receive(&self, raw_envelope: &[u8], attachments: Vec<Attachment>) -> DispatchOutcome {
        match self.codec.decode_inbound(raw_envelope, attachments) {
            Ok(Inbound::Message(decoded)) => self.deliver(decoded),
            Ok(Inbound::Notification(notification)) => self.fulfil(notification),
            Err(e) => {
                DECODE_FAILURES.inc();
                DispatchOutcome::Rejected {
                    locator: e.locator(),
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Unpack a `multipart/related` body and route it.
    pub fn on_receive_mime(&self, content_type: &str, body: &[u8]) -> DispatchOutcome {
        match mime::unpackage(content_type, body) {
            Ok((envelope, attachments)) => self.on_receive(&envelope, attachments),
            Err(e) => {
                warn!(error = %e, content_type, "Dropping malformed multipart body");
                DECODE_FAILURES.inc();
                DispatchOutcome::Rejected {
                    reason: e.to_string(),
                    locator: None,
                }
            }
        }
    }

    fn fulfil(&self, notification: Notification) -> DispatchOutcome {
        let kind = notification.kind;
        let key = notification.key.clone();
        debug!(
            kind = %kind,
            key = %key,
            acknowledged = notification.is_acknowledged(),
            "Received acknowledgement"
        );

        let waiting = self.table.fulfil(&key, notification);
        NOTIFICATIONS_FULFILLED.with_label_values(&[kind.as_str()]).inc();

        DispatchOutcome::Fulfilled { kind, key, waiting }
    }

    fn deliver(&self, decoded: DecodedMessage) -> DispatchOutcome {
        // Handlers may register or deregister from inside a callback.
        let handlers: Vec<Arc<dyn MessageHandler>> = self.handlers.read().clone();
        INBOUND_MESSAGES_DELIVERED.inc();

        if handlers.is_empty() {
            warn!(message_id = %decoded.message_id, "No handler registered for inbound message");
        }

        let mut failures = 0;
        for (index, handler) in handlers.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler.on_message(&decoded.message))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    failures += 1;
                    HANDLER_FAILURES.with_label_values(&["error"]).inc();
                    error!(
                        message_id = %decoded.message_id,
                        handler = index,
                        error = %e,
                        "Message handler failed"
                    );
                }
                Err(_) => {
                    failures += 1;
                    HANDLER_FAILURES.with_label_values(&["panic"]).inc();
                    error!(
                        message_id = %decoded.message_id,
                        handler = index,
                        "Message handler panicked"
                    );
                }
            }
        }

        DispatchOutcome::Delivered {
            message_id: decoded.message_id,
            handlers: handlers.len(),
            failures,
        }
    }
}
