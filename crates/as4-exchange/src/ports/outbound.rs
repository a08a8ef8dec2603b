//! Outbound port: the transport to the local gateway.

use async_trait::async_trait;
use shared_types::{Attachment, ErrorRecord, WireEnvelope};
use thiserror::Error;

/// Failures below the protocol level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("endpoint {0} unreachable")]
    Unreachable(String),

    #[error("transport I/O error: {0}")]
    Io(String),

    #[error("transport closed")]
    Closed,
}

/// Sends one envelope with its attachments.
///
/// Acknowledgements never come back through this call; they arrive later
/// through the inbound dispatcher. The return value only reports an
/// immediate protocol fault.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn transmit(
        &self,
        envelope: &WireEnvelope,
        attachments: &[Attachment],
        endpoint_url: &str,
        certificate: &[u8],
    ) -> Result<Option<ErrorRecord>, TransportError>;
}
