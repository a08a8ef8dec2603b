//! Error types for the wire codec.

use shared_types::{IdentifierError, MessageError};
use thiserror::Error;

/// Errors raised while encoding an outbound message. Never retryable.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("Cannot encode a message without payloads")]
    NoPayloads,

    #[error("Envelope serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while decoding inbound wire data.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Malformed envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),

    #[error("Missing mandatory property '{name}'")]
    MissingProperty { name: &'static str },

    #[error("Property '{name}' does not hold a valid identifier: {source}")]
    InvalidIdentifier {
        name: &'static str,
        #[source]
        source: IdentifierError,
    },

    #[error("Attachment {content_id} has no matching PartInfo")]
    MissingPartInfo { content_id: String },

    #[error("PartInfo references {content_id} but no such attachment was received")]
    MissingAttachment { content_id: String },

    #[error("Attachment {content_id} was received more than once")]
    DuplicateAttachment { content_id: String },

    #[error("Unknown acknowledgement result '{0}'")]
    UnknownResult(String),

    #[error("Unknown notification action '{0}'")]
    UnknownAction(String),

    #[error("Envelope {message_id} carries a fault ({error_code}) instead of a message")]
    UnexpectedFault {
        message_id: String,
        error_code: String,
    },

    #[error("Decoded message is invalid: {0}")]
    Message(#[from] MessageError),
}

impl DecodeError {
    /// Path-like locator of the offending element, for diagnostics.
    #[must_use]
    pub fn locator(&self) -> Option<String> {
        match self {
            Self::MissingProperty { name } | Self::InvalidIdentifier { name, .. } => {
                Some(format!("MessageProperties/Property[@name='{name}']"))
            }
            Self::MissingPartInfo { content_id } | Self::DuplicateAttachment { content_id } => {
                Some(format!("Attachment[Content-ID='<{content_id}>']"))
            }
            Self::MissingAttachment { content_id } => {
                Some(format!("PayloadInfo/PartInfo[@href='cid:{content_id}']"))
            }
            Self::UnknownResult(_) => Some("MessageProperties/Property[@name='Result']".into()),
            Self::UnknownAction(_) => Some("CollaborationInfo/Action".into()),
            Self::UnexpectedFault { .. } => Some("Fault".into()),
            Self::MalformedEnvelope(_) | Self::Message(_) => None,
        }
    }
}

/// Errors raised while parsing a multipart/related body.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MimeError {
    #[error("Content-Type has no boundary parameter: {0}")]
    MissingBoundary(String),

    #[error("Body does not contain the boundary delimiter")]
    MissingDelimiter,

    #[error("Body ends before the closing delimiter")]
    Unterminated,

    #[error("Part {index} is malformed: {reason}")]
    MalformedPart { index: usize, reason: String },

    #[error("Part {index} has no Content-ID header")]
    MissingContentId { index: usize },

    #[error("No root part found (start: {start:?})")]
    MissingRoot { start: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locators() {
        let err = DecodeError::MissingProperty { name: "ErrorCode" };
        assert_eq!(
            err.locator().as_deref(),
            Some("MessageProperties/Property[@name='ErrorCode']")
        );

        let err = DecodeError::MissingAttachment {
            content_id: "doc@a".into(),
        };
        assert_eq!(
            err.locator().as_deref(),
            Some("PayloadInfo/PartInfo[@href='cid:doc@a']")
        );
    }
}
