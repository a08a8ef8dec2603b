//! Cross-crate flows and the fixtures they share.

pub mod exchange_flows;
pub mod inbound_flows;

use as4_exchange::{ExchangeConfig, ExchangeService, GatewayScript, LoopbackGateway};
use shared_types::{BusinessMessage, Identifier, Payload, RoutingInformation};
use std::sync::Arc;

pub const PARTICIPANT_SCHEME: &str = "iso6523-actorid-upis";
pub const DOCUMENT_SCHEME: &str = "busdox-docid-qns";
pub const PROCESS_SCHEME: &str = "cenbii-procid-ubl";
pub const ENDPOINT_URL: &str = "https://ap.example.org/as4";

pub fn identifier(scheme: &str, value: &str) -> Identifier {
    Identifier::new(scheme, value).expect("valid identifier")
}

pub fn routing() -> RoutingInformation {
    RoutingInformation {
        sender: identifier(PARTICIPANT_SCHEME, "0088:5798000000001"),
        receiver: identifier(PARTICIPANT_SCHEME, "0088:5798000000002"),
        document_type: identifier(
            DOCUMENT_SCHEME,
            "urn:oasis:names:specification:ubl:schema:xsd:Invoice-2::Invoice##urn:cen.eu:en16931:2017::2.1",
        ),
        process: identifier(PROCESS_SCHEME, "urn:fdc:peppol.eu:2017:poacc:billing:01:1.0"),
        transport_profile: "peppol-transport-as4-v2_0".to_string(),
        endpoint_url: Some(ENDPOINT_URL.to_string()),
        certificate: Some(vec![0x30, 0x82, 0x01, 0x0a]),
    }
}

pub fn invoice() -> BusinessMessage {
    let routing = routing();
    BusinessMessage::builder()
        .sender(routing.sender)
        .receiver(routing.receiver)
        .document_type(routing.document_type)
        .process(routing.process)
        .payload(Payload::new(
            "application/xml",
            "invoice@sender.example.org",
            b"<Invoice><ID>INV-1</ID></Invoice>".to_vec(),
        ))
        .payload(Payload::new(
            "application/pdf",
            "visual@sender.example.org",
            vec![0x25, 0x50, 0x44, 0x46, 0x00, 0xff],
        ))
        .build()
        .expect("complete message")
}

/// A service whose transport is a connected loopback gateway.
pub fn loopback_service(
    script: GatewayScript,
    wait_ms: u64,
) -> (ExchangeService, Arc<LoopbackGateway>) {
    let gateway = Arc::new(LoopbackGateway::new(script));
    let mut config = ExchangeConfig::default();
    config.timeouts.wait_ms = wait_ms;
    let service = ExchangeService::new(config, gateway.clone()).expect("valid config");
    gateway.connect(service.dispatcher());
    (service, gateway)
}
