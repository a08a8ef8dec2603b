//! # Error Types
//!
//! Validation errors raised while constructing the shared model types.

use thiserror::Error;

/// Errors raised when constructing or parsing an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The scheme part was empty.
    #[error("Identifier scheme cannot be empty (value: {value})")]
    EmptyScheme { value: String },

    /// The value part was empty.
    #[error("Identifier value cannot be empty (scheme: {scheme})")]
    EmptyValue { scheme: String },

    /// The URI-encoded form had no `scheme::value` separator.
    #[error("Identifier '{0}' is not in 'scheme::value' form")]
    MissingSeparator(String),
}

/// Errors raised by [`crate::BusinessMessageBuilder::build`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageError {
    /// A mandatory identifier was never set on the builder.
    #[error("Business message is missing the {0} identifier")]
    MissingIdentifier(&'static str),

    /// No payload was added.
    #[error("Business message must carry at least one payload")]
    NoPayloads,

    /// Two payloads share a content identifier.
    #[error("Duplicate payload content identifier: {0}")]
    DuplicateContentId(String),

    /// A payload had an empty content identifier.
    #[error("Payload content identifier cannot be empty")]
    EmptyContentId,

    /// A payload had an empty mime type.
    #[error("Payload {content_id} has an empty mime type")]
    EmptyMimeType { content_id: String },
}

/// Errors raised when routing information is unusable for a transmission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// No certificate was discovered for the receiver.
    #[error("Routing information for {receiver} has no target certificate")]
    MissingCertificate { receiver: String },

    /// No endpoint URL was discovered for the receiver.
    #[error("Routing information for {receiver} has no target endpoint URL")]
    MissingEndpoint { receiver: String },

    /// The transport profile name was empty.
    #[error("Routing information for {receiver} has no transport profile")]
    MissingTransportProfile { receiver: String },
}
