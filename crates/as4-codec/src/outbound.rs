//! Envelope construction.

use crate::codec::WireCodec;
use crate::constants::{
    props, ACTION_FAULT, ACTION_RELAY_RESULT, ACTION_SUBMISSION_RESULT, NOTIFICATION_SERVICE,
    RESPONDER_ROLE,
};
use crate::error::EncodeError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use shared_types::{
    Attachment, BusinessMessage, CollaborationInfo, ErrorRecord, MessageInfo, Notification,
    NotificationKind, PartInfo, PartyInfo, Property, PropertyBag, RoutingInformation, Service,
    WireEnvelope,
};
use tracing::debug;
use uuid::Uuid;

/// An outbound envelope with the attachments it references.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedMessage {
    pub envelope: WireEnvelope,
    pub attachments: Vec<Attachment>,
}

impl EncodedMessage {
    #[must_use]
    pub fn message_id(&self) -> &str {
        self.envelope.message_id()
    }

    #[must_use]
    pub fn conversation_id(&self) -> &str {
        &self.envelope.collaboration_info.conversation_id
    }
}

impl WireCodec {
    /// Build the envelope and attachments for one outbound business message.
    ///
    /// A fresh message id and conversation id are generated on every call.
    /// Payload parts are referenced in input order.
    pub fn encode_outbound(
        &self,
        routing: &RoutingInformation,
        message: &BusinessMessage,
    ) -> Result<EncodedMessage, EncodeError> {
        if message.payloads().is_empty() {
            return Err(EncodeError::NoPayloads);
        }

        let message_id = self.ids.next_id();
        let conversation_id = Uuid::new_v4().to_string();

        let sender = message.sender();
        let receiver = message.receiver();
        let process = message.process();
        let document_type = message.document_type();

        let collaboration_info = CollaborationInfo {
            service: Service {
                value: process.value().to_string(),
                service_type: Some(process.scheme().to_string()),
            },
            action: document_type.uri_encoded(),
            conversation_id: conversation_id.clone(),
        };

        let mut properties = PropertyBag::new();
        properties.insert(Property::typed(
            props::ORIGINAL_SENDER,
            sender.value(),
            sender.scheme(),
        ));
        properties.insert(Property::typed(
            props::FINAL_RECIPIENT,
            receiver.value(),
            receiver.scheme(),
        ));
        properties.insert(Property::typed(
            props::SERVICE,
            process.value(),
            process.scheme(),
        ));
        properties.set(props::SERVICE_TYPE, process.scheme());
        properties.insert(Property::typed(
            props::ACTION,
            document_type.value(),
            document_type.scheme(),
        ));
        properties.set(props::TO_PARTY_ID, receiver.value());
        properties.set(props::TO_PARTY_ID_TYPE, receiver.scheme());
        properties.set(props::TO_PARTY_ROLE, RESPONDER_ROLE);
        if let Some(certificate) = &routing.certificate {
            properties.set(props::TO_PARTY_CERTIFICATE, STANDARD.encode(certificate));
        }
        if let Some(url) = &routing.endpoint_url {
            properties.set(props::TARGET_URL, url.as_str());
        }
        properties.set(props::MESSAGE_ID, message_id.as_str());
        properties.set(props::CONVERSATION_ID, conversation_id.as_str());

        let mut payload_info = Vec::with_capacity(message.payloads().len());
        let mut attachments = Vec::with_capacity(message.payloads().len());
        for payload in message.payloads() {
            payload_info.push(PartInfo::for_content(
                payload.content_id(),
                payload.mime_type(),
            ));
            attachments.push(Attachment {
                content_id: payload.content_id().to_string(),
                mime_type: payload.mime_type().to_string(),
                data: payload.content().to_vec(),
            });
        }

        let envelope = WireEnvelope {
            message_info: MessageInfo {
                timestamp: Utc::now(),
                message_id,
                ref_to_message_id: None,
            },
            party_info: PartyInfo {
                from: self.config.local_party.clone(),
                to: self.config.gateway_party.clone(),
            },
            collaboration_info,
            message_properties: properties,
            payload_info,
            fault: None,
        };

        debug!(
            message_id = %envelope.message_id(),
            sender = %sender,
            receiver = %receiver,
            parts = attachments.len(),
            "Encoded outbound message"
        );

        Ok(EncodedMessage {
            envelope,
            attachments,
        })
    }

    /// Build the acknowledgement envelope a gateway sends back for `notification`.
    ///
    /// `RefToMessageId` is the notification key; `MessageId` is set only when
    /// the notification carries one.
    #[must_use]
    pub fn encode_acknowledgement(&self, notification: &Notification) -> WireEnvelope {
        let action = match notification.kind {
            NotificationKind::Submission => ACTION_SUBMISSION_RESULT,
            NotificationKind::Relay => ACTION_RELAY_RESULT,
        };

        let mut properties = PropertyBag::new();
        if let Some(id) = &notification.message_id {
            properties.set(props::MESSAGE_ID, id.as_str());
        }
        properties.set(props::REF_TO_MESSAGE_ID, notification.key.as_str());
        properties.set(props::RESULT, notification.result.wire_value());
        if let Some(detail) = &notification.error {
            properties.set(props::ERROR_CODE, detail.code.as_str());
            if let Some(severity) = &detail.severity {
                properties.set(props::SEVERITY, severity.as_str());
            }
            if let Some(short) = &detail.short_description {
                properties.set(props::SHORT_DESCRIPTION, short.as_str());
            }
            if let Some(long) = &detail.description {
                properties.set(props::DESCRIPTION, long.as_str());
            }
        }

        let message_id = notification
            .message_id
            .clone()
            .unwrap_or_else(|| self.ids.next_id());

        self.signal_envelope(message_id, Some(notification.key.clone()), action, properties)
    }

    /// Build an envelope that carries only a protocol fault.
    #[must_use]
    pub fn encode_fault(&self, record: &ErrorRecord) -> WireEnvelope {
        let mut envelope = self.signal_envelope(
            self.ids.next_id(),
            record.ref_to_message_id.clone(),
            ACTION_FAULT,
            PropertyBag::new(),
        );
        envelope.fault = Some(record.clone());
        envelope
    }

    fn signal_envelope(
        &self,
        message_id: String,
        ref_to_message_id: Option<String>,
        action: &str,
        message_properties: PropertyBag,
    ) -> WireEnvelope {
        let conversation_id = ref_to_message_id
            .clone()
            .unwrap_or_else(|| message_id.clone());

        WireEnvelope {
            message_info: MessageInfo {
                timestamp: Utc::now(),
                message_id,
                ref_to_message_id,
            },
            party_info: PartyInfo {
                from: self.config.gateway_party.clone(),
                to: self.config.local_party.clone(),
            },
            collaboration_info: CollaborationInfo {
                service: Service {
                    value: NOTIFICATION_SERVICE.to_string(),
                    service_type: None,
                },
                action: action.to_string(),
                conversation_id,
            },
            message_properties,
            payload_info: Vec::new(),
            fault: None,
        }
    }
}
