//! Message id generation.
//!
//! Ids are a random v4 UUID suffixed with a fixed domain tag,
//! e.g. `0b7f...@as4.exchange`.

use uuid::Uuid;

/// Default domain tag appended to generated ids.
pub const DEFAULT_MESSAGE_ID_DOMAIN: &str = "as4.exchange";

/// Generates globally unique message ids.
#[derive(Debug, Clone)]
pub struct MessageIdGenerator {
    domain: String,
}

impl MessageIdGenerator {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
        }
    }

    /// Generate a fresh message id.
    #[must_use]
    pub fn next_id(&self) -> String {
        format!("{}@{}", Uuid::new_v4(), self.domain)
    }

    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl Default for MessageIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_MESSAGE_ID_DOMAIN)
    }
}
