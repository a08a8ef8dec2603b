//! # Exchange Flows
//!
//! `ExchangeCoordinator::send` against the loopback gateway, which answers
//! through the real dispatcher:
//!
//! 1. **Send**: routing validated, envelope encoded, transmitted
//! 2. **Submission hop**: acknowledgement keyed by the outbound id `M1`
//! 3. **Relay hop**: acknowledgement keyed by the id `M2` that the first
//!    acknowledgement introduced

#[cfg(test)]
mod tests {
    use super::super::{invoice, loopback_service, routing, ENDPOINT_URL};
    use as4_codec::constants::props;
    use as4_exchange::{ExchangeError, GatewayScript, HopOutcome, LoopbackGateway};
    use as4_telemetry::EXCHANGE_OUTCOMES;
    use shared_types::{ErrorDetail, ErrorRecord, NotificationKind};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use tokio_test::{assert_err, assert_ok};

    // =========================================================================
    // SUCCESS
    // =========================================================================

    #[tokio::test]
    async fn test_two_hop_exchange_succeeds() {
        let (service, gateway) = loopback_service(GatewayScript::accept_all(), 2_000);

        let receipt = assert_ok!(service.coordinator().send(&routing(), &invoice(), None).await);

        let sent = gateway.transmissions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].envelope.message_id(), receipt.message_id);
        assert_eq!(sent[0].endpoint_url, ENDPOINT_URL);
        assert_eq!(sent[0].certificate, vec![0x30, 0x82, 0x01, 0x0a]);
        assert_eq!(sent[0].attachments.len(), 2);
        assert_ne!(receipt.relay_message_id, receipt.message_id);

        // Both notifications were claimed.
        assert!(service.table().is_empty());
        assert!(EXCHANGE_OUTCOMES.with_label_values(&["success"]).get() >= 1.0);
    }

    #[tokio::test]
    async fn test_envelope_carries_routing_properties() {
        let (service, gateway) = loopback_service(GatewayScript::accept_all(), 2_000);
        assert_ok!(service.coordinator().send(&routing(), &invoice(), None).await);

        let envelope = &gateway.transmissions()[0].envelope;
        let bag = &envelope.message_properties;
        assert_eq!(bag.value(props::TARGET_URL), Some(ENDPOINT_URL));
        assert_eq!(bag.value(props::TO_PARTY_ID), Some("0088:5798000000002"));
        assert_eq!(
            bag.value(props::ORIGINAL_SENDER),
            Some("0088:5798000000001")
        );
        let hrefs: Vec<&str> = envelope.referenced_content_ids().collect();
        assert_eq!(
            hrefs,
            vec!["invoice@sender.example.org", "visual@sender.example.org"]
        );
    }

    #[tokio::test]
    async fn test_acknowledgement_before_wait_is_not_lost() {
        let script = GatewayScript::accept_all().with_delay(Duration::ZERO);
        let (service, _) = loopback_service(script, 2_000);

        assert_ok!(service.coordinator().send(&routing(), &invoice(), None).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_exchanges_do_not_cross() {
        let (service, gateway) = loopback_service(GatewayScript::accept_all(), 5_000);
        let service = Arc::new(service);

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let service = Arc::clone(&service);
            tasks.push(tokio::spawn(async move {
                let (routing, message) = (routing(), invoice());
                let result = service.coordinator().send(&routing, &message, None).await;
                result
            }));
        }

        let mut ids = std::collections::HashSet::new();
        for task in tasks {
            let receipt = assert_ok!(task.await.expect("task panicked"));
            assert!(ids.insert(receipt.message_id));
        }
        assert_eq!(gateway.transmission_count(), 16);
        assert!(service.table().is_empty());
    }

    // =========================================================================
    // RELAY FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_missing_receipt_is_relay_specific_failure() {
        let detail = ErrorDetail::new("EBMS:0301")
            .with_severity("failure")
            .with_short_description("MissingReceipt")
            .with_description("No receipt from the receiving access point");
        let script = GatewayScript::accept_all().with_relay(HopOutcome::Reject(detail.clone()));
        let (service, _) = loopback_service(script, 2_000);

        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        match &err {
            ExchangeError::RelaySpecificFailure {
                message_id,
                relay_message_id,
                detail: reported,
            } => {
                assert_ne!(message_id, relay_message_id);
                assert_eq!(reported, &detail);
            }
            other => panic!("expected relay specific failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_other_relay_error_is_generic_failure() {
        let script = GatewayScript::accept_all().with_relay(HopOutcome::reject("EBMS:0345"));
        let (service, _) = loopback_service(script, 2_000);

        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        assert!(matches!(err, ExchangeError::RelayGenericFailure { .. }));
        assert_eq!(err.error_code(), Some("EBMS:0345"));
    }

    // =========================================================================
    // SUBMISSION FAILURES
    // =========================================================================

    #[tokio::test]
    async fn test_rejected_submission() {
        let script = GatewayScript::accept_all().with_submission(HopOutcome::reject("EBMS:0004"));
        let (service, _) = loopback_service(script, 2_000);

        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        assert!(matches!(err, ExchangeError::SubmissionFailed { .. }));
        assert_eq!(err.error_code(), Some("EBMS:0004"));
    }

    #[tokio::test]
    async fn test_submission_without_chained_id_is_malformed() {
        let script = GatewayScript::accept_all().without_chained_id();
        let (service, _) = loopback_service(script, 2_000);

        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        assert!(matches!(err, ExchangeError::MalformedAcknowledgement { .. }));
    }

    // =========================================================================
    // TIMEOUTS
    // =========================================================================

    #[tokio::test]
    async fn test_submission_timeout_references_outbound_id() {
        let script = GatewayScript::accept_all().with_submission(HopOutcome::Silent);
        let (service, gateway) = loopback_service(script, 100);

        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        let m1 = gateway.transmissions()[0].envelope.message_id().to_string();
        match err {
            ExchangeError::CorrelationTimeout { hop, key, waited } => {
                assert_eq!(hop, NotificationKind::Submission);
                assert_eq!(key, m1);
                assert!(waited >= Duration::from_millis(100));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_relay_timeout_references_chained_id() {
        let script = GatewayScript::accept_all().with_relay(HopOutcome::Silent);
        let (service, gateway) = loopback_service(script, 100);

        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        let m1 = gateway.transmissions()[0].envelope.message_id().to_string();
        match err {
            ExchangeError::CorrelationTimeout { hop, key, .. } => {
                assert_eq!(hop, NotificationKind::Relay);
                assert_ne!(key, m1);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_per_call_timeout_overrides_default() {
        let script = GatewayScript::accept_all().with_submission(HopOutcome::Silent);
        let (service, _) = loopback_service(script, 60_000);

        let started = Instant::now();
        let err = assert_err!(
            service
                .coordinator()
                .send(&routing(), &invoice(), Some(Duration::from_millis(50)))
                .await
        );

        assert!(matches!(err, ExchangeError::CorrelationTimeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    // =========================================================================
    // TRANSPORT AND ROUTING
    // =========================================================================

    #[tokio::test]
    async fn test_immediate_fault_ends_exchange() {
        let mut fault = ErrorRecord::new("EBMS:0004");
        fault.severity = Some("failure".into());
        fault.short_description = Some("Other".into());
        let (service, _) = loopback_service(GatewayScript::immediate_fault(fault), 60_000);

        let started = Instant::now();
        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        assert!(matches!(err, ExchangeError::TransportRejected { .. }));
        let detail = err.detail().expect("fault detail");
        assert_eq!(detail.code, "EBMS:0004");
        assert_eq!(detail.short_description.as_deref(), Some("Other"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_missing_certificate_sends_nothing() {
        let (service, gateway) = loopback_service(GatewayScript::accept_all(), 2_000);
        let mut routing = routing();
        routing.certificate = None;

        let err = assert_err!(service.coordinator().send(&routing, &invoice(), None).await);

        assert!(matches!(err, ExchangeError::InvalidRoutingInfo(_)));
        assert!(!err.after_transmission());
        assert_eq!(gateway.transmission_count(), 0);
    }

    #[tokio::test]
    async fn test_unconnected_gateway_is_transport_error() {
        let gateway = Arc::new(LoopbackGateway::new(GatewayScript::accept_all()));
        let service = as4_exchange::ExchangeService::new(
            as4_exchange::ExchangeConfig::default(),
            gateway,
        )
        .expect("valid config");

        let err = assert_err!(service.coordinator().send(&routing(), &invoice(), None).await);

        assert!(matches!(err, ExchangeError::Transport { .. }));
        assert!(err.after_transmission());
    }
}
