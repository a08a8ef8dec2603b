//! # Wire Envelope
//!
//! The header block of an ebMS3-style user or signal message. Payload bytes
//! are never part of the envelope; they travel alongside as [`Attachment`]s
//! referenced from [`PartInfo`] entries by content identifier.
//!
//! ## Invariants
//!
//! - Every `PartInfo` resolves to exactly one attachment of the same transmission.
//! - The conversation id is constant for one logical exchange.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of a content-id reference in `PartInfo/@href`.
pub const CID_PREFIX: &str = "cid:";

/// Part property carrying the payload mime type.
pub const MIME_TYPE_PROPERTY: &str = "MimeType";

/// The envelope header block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct WireEnvelope {
    pub message_info: MessageInfo,
    pub party_info: PartyInfo,
    pub collaboration_info: CollaborationInfo,
    #[serde(default)]
    pub message_properties: PropertyBag,
    #[serde(default)]
    pub payload_info: Vec<PartInfo>,
    /// Protocol-level fault, present only on rejections.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fault: Option<ErrorRecord>,
}

impl WireEnvelope {
    /// The envelope's message id.
    #[must_use]
    pub fn message_id(&self) -> &str {
        &self.message_info.message_id
    }

    /// Content identifiers referenced from the payload info, in order.
    pub fn referenced_content_ids(&self) -> impl Iterator<Item = &str> {
        self.payload_info.iter().map(PartInfo::content_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageInfo {
    pub timestamp: DateTime<Utc>,
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_to_message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartyInfo {
    pub from: Party,
    pub to: Party,
}

/// A party id with its optional type attribute and the party's role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Party {
    pub party_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub party_id_type: Option<String>,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CollaborationInfo {
    pub service: Service,
    pub action: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
}

/// A named string property with an optional `type` attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value")]
    pub value: String,
    #[serde(rename = "Type", default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            property_type: None,
        }
    }

    pub fn typed(
        name: impl Into<String>,
        value: impl Into<String>,
        property_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            property_type: Some(property_type.into()),
        }
    }
}

/// Ordered name→value property bag. Names are unique; setting an existing
/// name replaces it in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyBag(Vec<Property>);

impl PropertyBag {
    #[must_use]
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Insert or replace a property.
    pub fn insert(&mut self, property: Property) {
        match self.0.iter_mut().find(|p| p.name == property.name) {
            Some(existing) => *existing = property,
            None => self.0.push(property),
        }
    }

    /// Insert or replace an untyped property.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.insert(Property::new(name, value));
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.0.iter().find(|p| p.name == name)
    }

    /// Value of a property, if present.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&str> {
        self.get(name).map(|p| p.value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Property> for PropertyBag {
    fn from_iter<I: IntoIterator<Item = Property>>(iter: I) -> Self {
        let mut bag = Self::new();
        for property in iter {
            bag.insert(property);
        }
        bag
    }
}

/// Reference from the envelope to one attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PartInfo {
    pub href: String,
    #[serde(default)]
    pub part_properties: PropertyBag,
}

impl PartInfo {
    /// Reference the attachment with `content_id`.
    pub fn for_content(content_id: &str, mime_type: &str) -> Self {
        let mut part_properties = PropertyBag::new();
        part_properties.set(MIME_TYPE_PROPERTY, mime_type);
        Self {
            href: format!("{CID_PREFIX}{content_id}"),
            part_properties,
        }
    }

    /// The referenced content id, with any `cid:` prefix stripped.
    #[must_use]
    pub fn content_id(&self) -> &str {
        self.href.strip_prefix(CID_PREFIX).unwrap_or(&self.href)
    }

    /// The `MimeType` part property.
    #[must_use]
    pub fn mime_type(&self) -> Option<&str> {
        self.part_properties.value(MIME_TYPE_PROPERTY)
    }
}

/// A payload part carried alongside the envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub content_id: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// A protocol-level error: either an envelope fault or an immediate
/// transport rejection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ErrorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub error_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_to_message_id: Option<String>,
}

impl ErrorRecord {
    pub fn new(error_code: impl Into<String>) -> Self {
        Self {
            category: None,
            error_code: error_code.into(),
            severity: None,
            short_description: None,
            description: None,
            ref_to_message_id: None,
        }
    }
}
