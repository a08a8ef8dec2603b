//! Routing information produced by dynamic discovery.
//!
//! Read-only input to the exchange: the core never mutates it.

use crate::errors::RoutingError;
use crate::identifiers::Identifier;
use serde::{Deserialize, Serialize};

/// Where and how to deliver a message to its receiver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingInformation {
    pub sender: Identifier,
    pub receiver: Identifier,
    pub document_type: Identifier,
    pub process: Identifier,
    /// Transport profile name, e.g. `peppol-transport-as4-v2_0`.
    pub transport_profile: String,
    /// Endpoint URL of the receiver's gateway.
    pub endpoint_url: Option<String>,
    /// DER-encoded certificate of the receiver's gateway.
    pub certificate: Option<Vec<u8>>,
}

/// The delivery target of a validated route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryTarget<'a> {
    pub endpoint_url: &'a str,
    pub certificate: &'a [u8],
}

impl RoutingInformation {
    /// Check the fields required before any network activity and return
    /// the endpoint and certificate to deliver to.
    pub fn validate(&self) -> Result<DeliveryTarget<'_>, RoutingError> {
        let receiver = || self.receiver.uri_encoded();

        if self.transport_profile.trim().is_empty() {
            return Err(RoutingError::MissingTransportProfile { receiver: receiver() });
        }

        let endpoint_url = match &self.endpoint_url {
            Some(url) if !url.trim().is_empty() => url.as_str(),
            _ => return Err(RoutingError::MissingEndpoint { receiver: receiver() }),
        };

        let certificate = match &self.certificate {
            Some(cert) if !cert.is_empty() => cert.as_slice(),
            _ => return Err(RoutingError::MissingCertificate { receiver: receiver() }),
        };

        Ok(DeliveryTarget {
            endpoint_url,
            certificate,
        })
    }
}
