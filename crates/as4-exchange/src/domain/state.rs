//! Exchange lifecycle.
//!
//! ```text
//! Created → Encoded → Transmitted → AwaitingSubmission
//!     → SubmissionAccepted → AwaitingRelay → RelayAccepted
//!     ↘ SubmissionRejected               ↘ RelayRejected
//! ```

use std::fmt;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExchangeState {
    Created,
    Encoded,
    Transmitted,
    AwaitingSubmission,
    SubmissionAccepted,
    SubmissionRejected,
    AwaitingRelay,
    RelayAccepted,
    RelayRejected,
}

impl ExchangeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Encoded => "encoded",
            Self::Transmitted => "transmitted",
            Self::AwaitingSubmission => "awaiting_submission",
            Self::SubmissionAccepted => "submission_accepted",
            Self::SubmissionRejected => "submission_rejected",
            Self::AwaitingRelay => "awaiting_relay",
            Self::RelayAccepted => "relay_accepted",
            Self::RelayRejected => "relay_rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::SubmissionRejected | Self::RelayAccepted | Self::RelayRejected
        )
    }

    /// Whether `next` directly follows `self`.
    pub fn can_advance_to(&self, next: ExchangeState) -> bool {
        use ExchangeState::*;
        matches!(
            (self, next),
            (Created, Encoded)
                | (Encoded, Transmitted)
                | (Transmitted, AwaitingSubmission)
                | (AwaitingSubmission, SubmissionAccepted)
                | (AwaitingSubmission, SubmissionRejected)
                | (SubmissionAccepted, AwaitingRelay)
                | (AwaitingRelay, RelayAccepted)
                | (AwaitingRelay, RelayRejected)
        )
    }
}

impl fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tracks one exchange through its states.
#[derive(Debug)]
pub(crate) struct ExchangeProgress {
    state: ExchangeState,
    message_id: Option<String>,
}

impl ExchangeProgress {
    pub(crate) fn new() -> Self {
        Self {
            state: ExchangeState::Created,
            message_id: None,
        }
    }

    pub(crate) fn state(&self) -> ExchangeState {
        self.state
    }

    pub(crate) fn advance(&mut self, next: ExchangeState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal exchange transition {} -> {}",
            self.state,
            next
        );
        debug!(
            message_id = self.message_id.as_deref().unwrap_or("-"),
            from = %self.state,
            to = %next,
            "Exchange state changed"
        );
        self.state = next;
    }

    pub(crate) fn set_message_id(&mut self, message_id: &str) {
        self.message_id = Some(message_id.to_string());
    }
}

/// Result of a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeReceipt {
    /// Id of the outbound message (first hop key)
    pub message_id: String,
    /// Id carried by the submission acknowledgement (second hop key)
    pub relay_message_id: String,
    pub conversation_id: String,
    pub elapsed: Duration,
}
