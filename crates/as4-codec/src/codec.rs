//! The wire codec and its configuration.

use crate::constants::{INITIATOR_ROLE, RESPONDER_ROLE};
use crate::error::{DecodeError, EncodeError};
use crate::message_id::{MessageIdGenerator, DEFAULT_MESSAGE_ID_DOMAIN};
use shared_types::{Party, WireEnvelope};

/// Static party and id settings of the codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    /// `From` party of outbound messages (this sender).
    pub local_party: Party,
    /// `To` party of outbound messages (the local gateway).
    pub gateway_party: Party,
    /// Domain tag appended to generated message ids.
    pub message_id_domain: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            local_party: Party {
                party_id: "as4-sender".to_string(),
                party_id_type: None,
                role: INITIATOR_ROLE.to_string(),
            },
            gateway_party: Party {
                party_id: "as4-gateway".to_string(),
                party_id_type: None,
                role: RESPONDER_ROLE.to_string(),
            },
            message_id_domain: DEFAULT_MESSAGE_ID_DOMAIN.to_string(),
        }
    }
}

/// Maps business messages to envelopes and back.
///
/// Holds no mutable state: every call works on caller-owned data, so one
/// codec can be shared freely between threads.
#[derive(Debug, Clone)]
pub struct WireCodec {
    pub(crate) config: CodecConfig,
    pub(crate) ids: MessageIdGenerator,
}

impl WireCodec {
    pub fn new(config: CodecConfig) -> Self {
        let ids = MessageIdGenerator::new(config.message_id_domain.clone());
        Self { config, ids }
    }

    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Generate a fresh message id in this codec's domain.
    #[must_use]
    pub fn next_message_id(&self) -> String {
        self.ids.next_id()
    }

    /// Serialize an envelope to its wire bytes.
    pub fn to_wire(&self, envelope: &WireEnvelope) -> Result<Vec<u8>, EncodeError> {
        Ok(serde_json::to_vec(envelope)?)
    }

    /// Parse wire bytes into an envelope.
    pub fn parse_envelope(&self, raw: &[u8]) -> Result<WireEnvelope, DecodeError> {
        Ok(serde_json::from_slice(raw)?)
    }
}

impl Default for WireCodec {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}
