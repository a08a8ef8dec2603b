//! Inbound decoding: business messages, acknowledgements and faults.

use crate::codec::WireCodec;
use crate::constants::{
    props, ACTION_FAULT, ACTION_RELAY_RESULT, ACTION_SUBMISSION_RESULT, NOTIFICATION_SERVICE,
};
use crate::error::DecodeError;
use crate::resolve::{resolve_identifier, ResolutionPath};
use shared_types::{
    AckResult, Attachment, BusinessMessage, ErrorDetail, ErrorRecord, Notification,
    NotificationKind, Payload, WireEnvelope,
};
use std::collections::HashMap;
use tracing::{debug, warn};

/// A decoded inbound transmission.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Message(DecodedMessage),
    Notification(Notification),
}

/// A business message together with its envelope metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedMessage {
    pub message: BusinessMessage,
    pub message_id: String,
    pub conversation_id: String,
    /// Properties whose identifier was resolved through the scheme-less path.
    pub degraded: Vec<&'static str>,
}

impl DecodedMessage {
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }
}

/// What an envelope is, judged from its collaboration info.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvelopeKind {
    Business,
    Notification(NotificationKind),
    Fault,
}

/// An envelope is an acknowledgement only when both its service and its
/// action say so. A business message may legitimately use the notification
/// service URI as its process value; its action is then a URI-encoded
/// document type and it always references at least one payload part.
fn classify(envelope: &WireEnvelope) -> Result<EnvelopeKind, DecodeError> {
    let collaboration = &envelope.collaboration_info;
    if collaboration.service.value != NOTIFICATION_SERVICE {
        return Ok(EnvelopeKind::Business);
    }
    match collaboration.action.as_str() {
        ACTION_SUBMISSION_RESULT => Ok(EnvelopeKind::Notification(NotificationKind::Submission)),
        ACTION_RELAY_RESULT => Ok(EnvelopeKind::Notification(NotificationKind::Relay)),
        ACTION_FAULT => Ok(EnvelopeKind::Fault),
        _ if !envelope.payload_info.is_empty() => Ok(EnvelopeKind::Business),
        other => Err(DecodeError::UnknownAction(other.to_string())),
    }
}

impl WireCodec {
    /// Decode raw envelope bytes and their attachments.
    ///
    /// Failures are logged with the offending locator and, when the header
    /// parsed at all, the envelope's message id.
    pub fn decode_inbound(
        &self,
        raw_envelope: &[u8],
        attachments: Vec<Attachment>,
    ) -> Result<Inbound, DecodeError> {
        let envelope = match self.parse_envelope(raw_envelope) {
            Ok(envelope) => envelope,
            Err(e) => {
                let content_ids: Vec<&str> =
                    attachments.iter().map(|a| a.content_id.as_str()).collect();
                warn!(error = %e, ?content_ids, "Dropping unparseable inbound envelope");
                return Err(e);
            }
        };

        self.decode_envelope(&envelope, attachments)
            .inspect_err(|e| {
                warn!(
                    message_id = %envelope.message_id(),
                    locator = e.locator().as_deref().unwrap_or("-"),
                    error = %e,
                    "Failed to decode inbound envelope"
                );
            })
    }

    /// Decode an already parsed envelope.
    pub fn decode_envelope(
        &self,
        envelope: &WireEnvelope,
        attachments: Vec<Attachment>,
    ) -> Result<Inbound, DecodeError> {
        if let Some(fault) = &envelope.fault {
            return Err(DecodeError::UnexpectedFault {
                message_id: envelope.message_id().to_string(),
                error_code: fault.error_code.clone(),
            });
        }

        match classify(envelope)? {
            EnvelopeKind::Business => self
                .decode_business(envelope, attachments)
                .map(Inbound::Message),
            EnvelopeKind::Notification(kind) => {
                decode_notification(envelope, kind).map(Inbound::Notification)
            }
            EnvelopeKind::Fault => Err(DecodeError::UnexpectedFault {
                message_id: envelope.message_id().to_string(),
                error_code: String::new(),
            }),
        }
    }

    /// Extract the protocol fault from raw envelope bytes, if there is one.
    pub fn decode_fault(&self, raw_envelope: &[u8]) -> Result<Option<ErrorRecord>, DecodeError> {
        let envelope = self.parse_envelope(raw_envelope)?;
        Ok(envelope.fault)
    }

    fn decode_business(
        &self,
        envelope: &WireEnvelope,
        attachments: Vec<Attachment>,
    ) -> Result<DecodedMessage, DecodeError> {
        let bag = &envelope.message_properties;
        let mut degraded = Vec::new();

        let mut resolve = |name: &'static str| {
            let resolved = resolve_identifier(bag, name)?;
            if resolved.path == ResolutionPath::Parsed {
                warn!(
                    message_id = %envelope.message_id(),
                    property = name,
                    "Identifier has no type attribute, parsed scheme from value"
                );
                degraded.push(name);
            }
            Ok::<_, DecodeError>(resolved.identifier)
        };

        let sender = resolve(props::ORIGINAL_SENDER)?;
        let receiver = resolve(props::FINAL_RECIPIENT)?;
        let document_type = resolve(props::ACTION)?;
        let process = resolve(props::SERVICE)?;

        let mut by_content_id: HashMap<String, Attachment> =
            HashMap::with_capacity(attachments.len());
        for attachment in attachments {
            let content_id = attachment.content_id.clone();
            if !envelope
                .referenced_content_ids()
                .any(|referenced| referenced == content_id)
            {
                return Err(DecodeError::MissingPartInfo { content_id });
            }
            if by_content_id.insert(content_id.clone(), attachment).is_some() {
                return Err(DecodeError::DuplicateAttachment { content_id });
            }
        }

        let mut builder = BusinessMessage::builder()
            .sender(sender)
            .receiver(receiver)
            .document_type(document_type)
            .process(process);

        for part in &envelope.payload_info {
            let content_id = part.content_id();
            let attachment =
                by_content_id
                    .remove(content_id)
                    .ok_or_else(|| DecodeError::MissingAttachment {
                        content_id: content_id.to_string(),
                    })?;
            let mime_type = part
                .mime_type()
                .map(str::to_string)
                .unwrap_or(attachment.mime_type);
            builder = builder.payload(Payload::new(mime_type, content_id, attachment.data));
        }

        let message = builder.build()?;

        debug!(
            message_id = %envelope.message_id(),
            sender = %message.sender(),
            parts = message.payloads().len(),
            "Decoded inbound business message"
        );

        Ok(DecodedMessage {
            message,
            message_id: envelope.message_id().to_string(),
            conversation_id: envelope.collaboration_info.conversation_id.clone(),
            degraded,
        })
    }
}

fn decode_notification(
    envelope: &WireEnvelope,
    kind: NotificationKind,
) -> Result<Notification, DecodeError> {
    let bag = &envelope.message_properties;

    let key = bag
        .value(props::REF_TO_MESSAGE_ID)
        .ok_or(DecodeError::MissingProperty {
            name: props::REF_TO_MESSAGE_ID,
        })?;
    let message_id = bag.value(props::MESSAGE_ID).map(str::to_string);
    let result = bag.value(props::RESULT).ok_or(DecodeError::MissingProperty {
        name: props::RESULT,
    })?;
    let result =
        AckResult::from_wire(result).ok_or_else(|| DecodeError::UnknownResult(result.into()))?;

    let notification = match result {
        AckResult::Acknowledged => Notification::acknowledged(kind, key, message_id),
        AckResult::Error => {
            let code = bag.value(props::ERROR_CODE).ok_or(DecodeError::MissingProperty {
                name: props::ERROR_CODE,
            })?;
            let detail = ErrorDetail {
                code: code.to_string(),
                severity: bag.value(props::SEVERITY).map(str::to_string),
                short_description: bag.value(props::SHORT_DESCRIPTION).map(str::to_string),
                description: bag.value(props::DESCRIPTION).map(str::to_string),
            };
            Notification::error(kind, key, message_id, detail)
        }
    };

    debug!(
        kind = %kind,
        key = %notification.key,
        result = notification.result.wire_value(),
        "Decoded acknowledgement"
    );
    Ok(notification)
}
