//! # Acknowledgement Notifications
//!
//! Two acknowledgement kinds share one shape:
//!
//! - **Submission** (first hop): the local gateway accepted the message for
//!   relay. Its `message_id` is the id the relay acknowledgement will reference.
//! - **Relay** (second hop): the remote gateway's receipt or error.
//!
//! A notification is keyed by the message id it references and is consumed
//! exactly once by the matching waiter.

use crate::envelope::ErrorRecord;
use std::fmt;
use std::time::Instant;

/// Wire value of `Result` for a positive acknowledgement.
pub const RESULT_RECEIPT: &str = "Receipt";

/// Wire value of `Result` for a negative acknowledgement.
pub const RESULT_ERROR: &str = "Error";

/// Which hop an acknowledgement belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Submission,
    Relay,
}

impl NotificationKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submission => "submission",
            Self::Relay => "relay",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result tag of an acknowledgement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AckResult {
    Acknowledged,
    Error,
}

impl AckResult {
    /// Parse the wire `Result` value.
    #[must_use]
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            RESULT_RECEIPT => Some(Self::Acknowledged),
            RESULT_ERROR => Some(Self::Error),
            _ => None,
        }
    }

    #[must_use]
    pub fn wire_value(&self) -> &'static str {
        match self {
            Self::Acknowledged => RESULT_RECEIPT,
            Self::Error => RESULT_ERROR,
        }
    }
}

/// Structured error detail carried by a negative acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorDetail {
    pub code: String,
    pub severity: Option<String>,
    pub short_description: Option<String>,
    pub description: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    #[must_use]
    pub fn with_short_description(mut self, text: impl Into<String>) -> Self {
        self.short_description = Some(text.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(severity) = &self.severity {
            write!(f, " [{severity}]")?;
        }
        if let Some(short) = &self.short_description {
            write!(f, " {short}")?;
        }
        if let Some(long) = &self.description {
            write!(f, ": {long}")?;
        }
        Ok(())
    }
}

impl From<&ErrorRecord> for ErrorDetail {
    fn from(record: &ErrorRecord) -> Self {
        Self {
            code: record.error_code.clone(),
            severity: record.severity.clone(),
            short_description: record.short_description.clone(),
            description: record.description.clone(),
        }
    }
}

/// A decoded acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    /// The message id being acknowledged (`RefToMessageId`).
    pub key: String,
    /// The acknowledgement's own `MessageId`. For a submission acknowledgement
    /// this is the id the relay acknowledgement will reference.
    pub message_id: Option<String>,
    pub result: AckResult,
    /// Present iff `result` is [`AckResult::Error`].
    pub error: Option<ErrorDetail>,
    pub created_at: Instant,
}

impl Notification {
    /// A positive acknowledgement.
    pub fn acknowledged(
        kind: NotificationKind,
        key: impl Into<String>,
        message_id: Option<String>,
    ) -> Self {
        Self {
            kind,
            key: key.into(),
            message_id,
            result: AckResult::Acknowledged,
            error: None,
            created_at: Instant::now(),
        }
    }

    /// A negative acknowledgement.
    pub fn error(
        kind: NotificationKind,
        key: impl Into<String>,
        message_id: Option<String>,
        detail: ErrorDetail,
    ) -> Self {
        Self {
            kind,
            key: key.into(),
            message_id,
            result: AckResult::Error,
            error: Some(detail),
            created_at: Instant::now(),
        }
    }

    #[must_use]
    pub fn is_acknowledged(&self) -> bool {
        self.result == AckResult::Acknowledged
    }

    /// The error code, if this is a negative acknowledgement.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.code.as_str())
    }
}
