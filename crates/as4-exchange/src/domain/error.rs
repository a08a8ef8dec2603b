//! Exchange error taxonomy.
//!
//! Every failure of [`crate::ExchangeCoordinator::send`] maps to exactly one
//! variant. Variants raised after an acknowledgement carry its structured
//! error detail. None of them is retried.

use crate::ports::outbound::TransportError;
use as4_codec::EncodeError;
use shared_types::{ErrorDetail, NotificationKind, RoutingError};
use std::time::Duration;
use thiserror::Error;

/// Metric label values, one per error kind.
pub mod outcomes {
    pub const SUCCESS: &str = "success";
    pub const INVALID_ROUTING: &str = "invalid_routing";
    pub const ENCODE_ERROR: &str = "encode_error";
    pub const TRANSPORT_REJECTED: &str = "transport_rejected";
    pub const TRANSPORT_ERROR: &str = "transport_error";
    pub const TIMEOUT: &str = "timeout";
    pub const SUBMISSION_FAILED: &str = "submission_failed";
    pub const MALFORMED_ACK: &str = "malformed_ack";
    pub const RELAY_SPECIFIC: &str = "relay_specific";
    pub const RELAY_GENERIC: &str = "relay_generic";
}

#[derive(Debug, Error)]
pub enum ExchangeError {
    /// Routing information unusable; nothing was sent.
    #[error("Invalid routing information: {0}")]
    InvalidRoutingInfo(#[from] RoutingError),

    /// Outbound message could not be encoded; nothing was sent.
    #[error("Cannot encode message: {0}")]
    Encode(#[from] EncodeError),

    /// The transport answered the send with a protocol fault.
    #[error("Transport rejected {message_id}: {detail}")]
    TransportRejected {
        message_id: String,
        detail: ErrorDetail,
    },

    /// The transport failed below the protocol level.
    #[error("Transport failed for {message_id}: {source}")]
    Transport {
        message_id: String,
        #[source]
        source: TransportError,
    },

    /// No acknowledgement for `key` within the wait.
    #[error("No {hop} acknowledgement for {key} within {waited:?}")]
    CorrelationTimeout {
        hop: NotificationKind,
        key: String,
        waited: Duration,
    },

    /// The local gateway refused the submission.
    #[error("Submission of {message_id} failed: {detail}")]
    SubmissionFailed {
        message_id: String,
        detail: ErrorDetail,
    },

    /// The submission acknowledgement carried no id to chain the relay wait on.
    #[error("Submission acknowledgement for {message_id} carries no MessageId")]
    MalformedAcknowledgement { message_id: String },

    /// An acknowledgement of the other hop arrived under this hop's key.
    #[error("Expected {expected} acknowledgement for {key}, got {received}")]
    UnexpectedAcknowledgement {
        key: String,
        expected: NotificationKind,
        received: NotificationKind,
    },

    /// The remote gateway's receipt is missing (`EBMS:0301`).
    #[error("Relay of {message_id} failed, receipt missing: {detail}")]
    RelaySpecificFailure {
        message_id: String,
        relay_message_id: String,
        detail: ErrorDetail,
    },

    /// The remote gateway reported any other error.
    #[error("Relay of {message_id} failed: {detail}")]
    RelayGenericFailure {
        message_id: String,
        relay_message_id: String,
        detail: ErrorDetail,
    },
}

impl ExchangeError {
    /// Label used for the exchange outcome metric.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            Self::InvalidRoutingInfo(_) => outcomes::INVALID_ROUTING,
            Self::Encode(_) => outcomes::ENCODE_ERROR,
            Self::TransportRejected { .. } => outcomes::TRANSPORT_REJECTED,
            Self::Transport { .. } => outcomes::TRANSPORT_ERROR,
            Self::CorrelationTimeout { .. } => outcomes::TIMEOUT,
            Self::SubmissionFailed { .. } => outcomes::SUBMISSION_FAILED,
            Self::MalformedAcknowledgement { .. } | Self::UnexpectedAcknowledgement { .. } => {
                outcomes::MALFORMED_ACK
            }
            Self::RelaySpecificFailure { .. } => outcomes::RELAY_SPECIFIC,
            Self::RelayGenericFailure { .. } => outcomes::RELAY_GENERIC,
        }
    }

    /// Structured error detail reported by the remote side, if any.
    pub fn detail(&self) -> Option<&ErrorDetail> {
        match self {
            Self::TransportRejected { detail, .. }
            | Self::SubmissionFailed { detail, .. }
            | Self::RelaySpecificFailure { detail, .. }
            | Self::RelayGenericFailure { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// The ebMS error code, if any.
    pub fn error_code(&self) -> Option<&str> {
        self.detail().map(|d| d.code.as_str())
    }

    /// Whether any bytes left this process before the failure.
    pub fn after_transmission(&self) -> bool {
        !matches!(self, Self::InvalidRoutingInfo(_) | Self::Encode(_))
    }
}
