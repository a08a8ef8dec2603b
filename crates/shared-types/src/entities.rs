//! # Business Message Model
//!
//! A business message is immutable once built. The builder validates
//! completeness at build time:
//!
//! - all four identifiers are present,
//! - at least one payload is carried,
//! - content identifiers are non-empty and unique within the message.

use crate::errors::MessageError;
use crate::identifiers::Identifier;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One payload of a business message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    mime_type: String,
    content_id: String,
    content: Vec<u8>,
}

impl Payload {
    /// Create a payload.
    pub fn new(
        mime_type: impl Into<String>,
        content_id: impl Into<String>,
        content: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            mime_type: mime_type.into(),
            content_id: content_id.into(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    #[must_use]
    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// Consume the payload, returning `(mime_type, content_id, content)`.
    #[must_use]
    pub fn into_parts(self) -> (String, String, Vec<u8>) {
        (self.mime_type, self.content_id, self.content)
    }
}

/// A business document exchanged between two participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessMessage {
    sender: Identifier,
    receiver: Identifier,
    document_type: Identifier,
    process: Identifier,
    payloads: Vec<Payload>,
}

impl BusinessMessage {
    /// Start building a message.
    #[must_use]
    pub fn builder() -> BusinessMessageBuilder {
        BusinessMessageBuilder::default()
    }

    #[must_use]
    pub fn sender(&self) -> &Identifier {
        &self.sender
    }

    #[must_use]
    pub fn receiver(&self) -> &Identifier {
        &self.receiver
    }

    #[must_use]
    pub fn document_type(&self) -> &Identifier {
        &self.document_type
    }

    #[must_use]
    pub fn process(&self) -> &Identifier {
        &self.process
    }

    /// Payloads in their original order. Never empty.
    #[must_use]
    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    /// Look up a payload by content identifier.
    #[must_use]
    pub fn payload(&self, content_id: &str) -> Option<&Payload> {
        self.payloads.iter().find(|p| p.content_id == content_id)
    }
}

/// Builder for [`BusinessMessage`].
#[derive(Debug, Default, Clone)]
pub struct BusinessMessageBuilder {
    sender: Option<Identifier>,
    receiver: Option<Identifier>,
    document_type: Option<Identifier>,
    process: Option<Identifier>,
    payloads: Vec<Payload>,
}

impl BusinessMessageBuilder {
    #[must_use]
    pub fn sender(mut self, sender: Identifier) -> Self {
        self.sender = Some(sender);
        self
    }

    #[must_use]
    pub fn receiver(mut self, receiver: Identifier) -> Self {
        self.receiver = Some(receiver);
        self
    }

    #[must_use]
    pub fn document_type(mut self, document_type: Identifier) -> Self {
        self.document_type = Some(document_type);
        self
    }

    #[must_use]
    pub fn process(mut self, process: Identifier) -> Self {
        self.process = Some(process);
        self
    }

    /// Append a payload. Order is preserved.
    #[must_use]
    pub fn payload(mut self, payload: Payload) -> Self {
        self.payloads.push(payload);
        self
    }

    /// Validate and build the message.
    pub fn build(self) -> Result<BusinessMessage, MessageError> {
        let sender = self.sender.ok_or(MessageError::MissingIdentifier("sender"))?;
        let receiver = self
            .receiver
            .ok_or(MessageError::MissingIdentifier("receiver"))?;
        let document_type = self
            .document_type
            .ok_or(MessageError::MissingIdentifier("document type"))?;
        let process = self
            .process
            .ok_or(MessageError::MissingIdentifier("process"))?;

        if self.payloads.is_empty() {
            return Err(MessageError::NoPayloads);
        }

        let mut seen = HashSet::with_capacity(self.payloads.len());
        for payload in &self.payloads {
            if payload.content_id.is_empty() {
                return Err(MessageError::EmptyContentId);
            }
            if payload.mime_type.is_empty() {
                return Err(MessageError::EmptyMimeType {
                    content_id: payload.content_id.clone(),
                });
            }
            if !seen.insert(payload.content_id.as_str()) {
                return Err(MessageError::DuplicateContentId(payload.content_id.clone()));
            }
        }

        Ok(BusinessMessage {
            sender,
            receiver,
            document_type,
            process,
            payloads: self.payloads,
        })
    }
}
