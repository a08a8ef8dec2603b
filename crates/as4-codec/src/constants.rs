//! Wire names shared by the encoder and the decoder.

/// Service of acknowledgement messages sent back by the gateways.
pub const NOTIFICATION_SERVICE: &str = "http://docs.oasis-open.org/ebxml-msg/as4/200902/service";

/// Action of a first-hop (local gateway) acknowledgement.
pub const ACTION_SUBMISSION_RESULT: &str = "SubmissionResult";

/// Action of a second-hop (remote gateway) acknowledgement.
pub const ACTION_RELAY_RESULT: &str = "RelayResult";

/// Action of an envelope that only carries a fault.
pub const ACTION_FAULT: &str = "Fault";

/// Default ebMS3 initiator role.
pub const INITIATOR_ROLE: &str =
    "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/initiator";

/// Default ebMS3 responder role.
pub const RESPONDER_ROLE: &str =
    "http://docs.oasis-open.org/ebxml-msg/ebms/v3.0/ns/core/200704/responder";

/// Relay error code reported when the receiver's receipt is missing.
pub const EBMS_MISSING_RECEIPT: &str = "EBMS:0301";

/// Message property names.
pub mod props {
    pub const TO_PARTY_ID: &str = "ToPartyId";
    pub const TO_PARTY_ID_TYPE: &str = "ToPartyIdType";
    pub const TO_PARTY_ROLE: &str = "ToPartyRole";
    pub const TO_PARTY_CERTIFICATE: &str = "ToPartyCertificate";
    pub const TARGET_URL: &str = "TargetURL";
    pub const SERVICE: &str = "Service";
    pub const SERVICE_TYPE: &str = "ServiceType";
    pub const ACTION: &str = "Action";
    pub const MESSAGE_ID: &str = "MessageId";
    pub const REF_TO_MESSAGE_ID: &str = "RefToMessageId";
    pub const CONVERSATION_ID: &str = "ConversationId";
    pub const ORIGINAL_SENDER: &str = "originalSender";
    pub const FINAL_RECIPIENT: &str = "finalRecipient";
    pub const RESULT: &str = "Result";
    pub const ERROR_CODE: &str = "ErrorCode";
    pub const SEVERITY: &str = "severity";
    pub const SHORT_DESCRIPTION: &str = "ShortDescription";
    pub const DESCRIPTION: &str = "Description";
}
